//! Keyword-based veg / non-veg classification of food names
//!
//! Precedence is fixed and part of the artifact contract:
//! 1. a name containing "cheese" is veg, whatever else it contains
//! 2. otherwise the first non-veg keyword found as a substring makes it non-veg
//! 3. otherwise it is veg

use crate::models::FoodType;

/// Marker that forces a veg classification before any keyword scan
pub const CHEESE_MARKER: &str = "cheese";

/// Non-veg keywords, scanned in this order with substring matching
pub const NON_VEG_KEYWORDS: [&str; 18] = [
    "chicken", "beef", "pork", "lamb", "fish", "salmon", "tuna", "shrimp", "crab", "lobster",
    "egg", "turkey", "bacon", "sausage", "ham", "venison", "duck", "goose",
];

/// Which rule decided a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationRule {
    CheeseOverride,
    Keyword(&'static str),
    Default,
}

/// Classify a food name
pub fn classify(food_name: &str) -> FoodType {
    classify_with_reason(food_name).0
}

/// Classify a food name and report the rule that fired
pub fn classify_with_reason(food_name: &str) -> (FoodType, ClassificationRule) {
    let name = food_name.to_lowercase();

    if name.contains(CHEESE_MARKER) {
        return (FoodType::Veg, ClassificationRule::CheeseOverride);
    }

    match NON_VEG_KEYWORDS.iter().find(|keyword| name.contains(*keyword)) {
        Some(keyword) => (FoodType::NonVeg, ClassificationRule::Keyword(keyword)),
        None => (FoodType::Veg, ClassificationRule::Default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cheese_is_veg() {
        assert_eq!(classify("Swiss Cheese"), FoodType::Veg);
    }

    #[test]
    fn test_cheese_wins_over_non_veg_keywords() {
        // "cheeseburger" style names keep the cheese precedence even with meat keywords
        assert_eq!(classify("Cheeseburger"), FoodType::Veg);
        assert_eq!(
            classify_with_reason("Ham and Cheese Sandwich"),
            (FoodType::Veg, ClassificationRule::CheeseOverride)
        );
    }

    #[test]
    fn test_meat_keyword_is_non_veg() {
        assert_eq!(classify("Grilled Chicken"), FoodType::NonVeg);
        assert_eq!(
            classify_with_reason("SMOKED SALMON"),
            (FoodType::NonVeg, ClassificationRule::Keyword("salmon"))
        );
    }

    #[test]
    fn test_first_keyword_in_list_order_is_reported() {
        // "tuna" precedes "egg" in the scan order
        assert_eq!(
            classify_with_reason("egg and tuna salad"),
            (FoodType::NonVeg, ClassificationRule::Keyword("tuna"))
        );
    }

    #[test]
    fn test_default_is_veg() {
        assert_eq!(classify("Tofu Salad"), FoodType::Veg);
        assert_eq!(classify_with_reason(""), (FoodType::Veg, ClassificationRule::Default));
    }

    #[test]
    fn test_substring_matching_is_coarse() {
        // "hamburger" contains "ham", "eggplant" contains "egg"
        assert_eq!(classify("hamburger bun"), FoodType::NonVeg);
        assert_eq!(classify("eggplant"), FoodType::NonVeg);
    }
}
