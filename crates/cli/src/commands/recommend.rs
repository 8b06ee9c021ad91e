//! Interactive meal plan recommendation

use anyhow::{Context, Result};
use colored::Colorize;
use diet_lib::serving::{PlanResponse, RecommendationResponse};
use diet_lib::{FoodCatalog, FoodType, MealPlanner, UserQuery};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tabled::Tabled;
use tracing::debug;

use crate::client::ApiClient;
use crate::output::{
    color_category, color_label, format_calories, format_grams, print_info, print_json,
    print_warning, render_table, title_case, OutputFormat,
};
use crate::prompt::Prompter;

/// Form answers; `None` fields are asked for interactively
#[derive(Debug, Default)]
pub struct QueryArgs {
    pub age: Option<u32>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub food_pref: Option<FoodType>,
}

/// Where the plan comes from
pub enum PlanSource {
    Local { dataset: PathBuf, seed: Option<u64> },
    Remote { client: ApiClient },
}

#[derive(Tabled)]
struct MealRow {
    #[tabled(rename = "Meal")]
    meal: String,
    #[tabled(rename = "Food")]
    food: String,
    #[tabled(rename = "Calories")]
    calories: String,
    #[tabled(rename = "Protein")]
    protein: String,
    #[tabled(rename = "Fat")]
    fat: String,
    #[tabled(rename = "Carbs")]
    carbs: String,
}

/// Fill missing answers, keeping the form's defaults and ranges
pub fn complete_query<R: BufRead, W: Write>(
    args: QueryArgs,
    prompter: &mut Prompter<R, W>,
) -> Result<UserQuery> {
    let age = match args.age {
        Some(age) => age,
        None => prompter.number("Age", 25u32, 1..=100)?,
    };
    let height = match args.height {
        Some(height) => height,
        None => prompter.number("Height (cm)", 170.0, 50.0..=250.0)?,
    };
    let weight = match args.weight {
        Some(weight) => weight,
        None => prompter.number("Weight (kg)", 65.0, 10.0..=200.0)?,
    };
    let food_pref = match args.food_pref {
        Some(pref) => pref,
        None => prompter.choice("Food preference (veg/non-veg)", FoodType::Veg)?,
    };
    Ok(UserQuery {
        age,
        height,
        weight,
        food_pref,
    })
}

pub async fn recommend(args: QueryArgs, source: PlanSource, format: OutputFormat) -> Result<()> {
    // Questions go to stderr so stdout stays parseable
    let query = {
        let stdin = std::io::stdin();
        let mut prompter = Prompter::new(stdin.lock(), std::io::stderr());
        complete_query(args, &mut prompter)?
    };
    debug!(?query, "Query complete");

    let response = match source {
        PlanSource::Local { dataset, seed } => {
            let catalog = FoodCatalog::load(&dataset)
                .with_context(|| format!("Cannot load labeled dataset {}", dataset.display()))?;
            let mut rng = match seed {
                Some(seed) => ChaCha8Rng::seed_from_u64(seed),
                None => ChaCha8Rng::from_entropy(),
            };
            MealPlanner::new(catalog)
                .recommend(&query, &mut rng)?
                .to_response()
        }
        PlanSource::Remote { client } => client.recommend(&query).await?,
    };

    match format {
        OutputFormat::Json => print_json(&response),
        OutputFormat::Table => {
            print_response(&response);
            Ok(())
        }
    }
}

fn print_response(response: &RecommendationResponse) {
    match response {
        RecommendationResponse::Plan(plan) => {
            print_info(&format!(
                "Your BMI is {:.2} ({}). Based on this, we recommend a diet for {}.",
                plan.bmi,
                color_category(plan.category),
                color_label(plan.cluster)
            ));
            println!();
            println!("{}", render_table(meal_rows(plan)));
            println!("\nTotal: {}", format_calories(plan.total_calories()).bold());
        }
        RecommendationResponse::InsufficientData(missing) => {
            print_info(&format!(
                "Your BMI is {:.2} ({}). Based on this, we recommend a diet for {}.",
                missing.bmi,
                color_category(missing.category),
                color_label(missing.cluster)
            ));
            print_warning(&format!(
                "Not enough unique '{}' food options in the '{}' category ({} of {}). Please try a different preference.",
                missing.food_pref, missing.cluster, missing.available, missing.required
            ));
        }
    }
}

fn meal_rows(plan: &PlanResponse) -> Vec<MealRow> {
    plan.meals()
        .into_iter()
        .flat_map(|(meal, items)| {
            items.iter().enumerate().map(move |(i, r)| MealRow {
                meal: if i == 0 { meal.to_string() } else { String::new() },
                food: title_case(&r.food),
                calories: format_calories(r.caloric_value),
                protein: format_grams(r.protein),
                fat: format_grams(r.fat),
                carbs: format_grams(r.carbohydrates),
            })
        })
        .collect()
}
