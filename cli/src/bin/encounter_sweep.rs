use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Parser;
use skirmish_engine::api::{generate_encounter, EncounterRequest};
use skirmish_engine::{telemetry, Dice, Difficulty, DifficultyRating};

#[path = "../text.rs"]
mod text;

#[derive(Parser)]
#[command(name = "encounter-sweep")]
#[command(about = "Generate many encounters and report how their difficulty lands")]
struct Args {
    /// Comma-separated party levels
    #[arg(long, value_delimiter = ',', required = true, allow_hyphen_values = true)]
    levels: Vec<i32>,

    #[arg(long, default_value = "medium")]
    difficulty: Difficulty,

    /// Number of trials
    #[arg(long, default_value_t = 1000)]
    trials: u32,

    /// Built-in catalog name
    #[arg(long, default_value = "srd_core")]
    catalog: String,

    /// Catalog file (JSON or YAML); overrides --catalog
    #[arg(long)]
    catalog_file: Option<PathBuf>,

    #[arg(long, default_value_t = 10)]
    max: u32,

    #[arg(long, default_value_t = 1)]
    min: u32,

    /// RNG base seed (trial i uses seed+i)
    #[arg(long, default_value_t = 12345)]
    seed: u64,

    #[arg(long, default_value = "warn")]
    log: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    telemetry::init(&args.log);

    let catalog = text::load_catalog(args.catalog_file.as_deref(), &args.catalog)?;
    let request = EncounterRequest {
        party_levels: args.levels.clone(),
        difficulty: args.difficulty,
        monsters: Vec::new(),
        max_monsters: args.max,
        min_monsters: args.min,
    };

    let mut ratings: BTreeMap<DifficultyRating, u32> = BTreeMap::new();
    let mut on_target = 0u32;
    let mut empty = 0u32;
    let mut count_total = 0u64;
    let mut adjusted_total = 0u64;
    let mut fill_total = 0.0f64;
    let mut budget = 0u32;

    for i in 0..args.trials {
        let mut dice = Dice::from_seed(args.seed.wrapping_add(i as u64));
        let enc = generate_encounter(&request, &catalog, &mut dice)?;
        budget = enc.xp_budget;
        if enc.monsters.is_empty() {
            empty += 1;
            continue;
        }
        let rating = enc.rating();
        *ratings.entry(rating).or_default() += 1;
        if rating == DifficultyRating::from(args.difficulty) {
            on_target += 1;
        }
        count_total += enc.monster_count as u64;
        adjusted_total += enc.adjusted_xp as u64;
        if enc.xp_budget > 0 {
            fill_total += enc.total_xp as f64 / enc.xp_budget as f64;
        }
    }

    let filled = args.trials.saturating_sub(empty);
    let per = |total: f64| if filled == 0 { 0.0 } else { total / filled as f64 };

    println!("encounter-sweep results");
    println!("-----------------------");
    println!("trials:             {}", args.trials);
    println!("party:              {:?}", args.levels);
    println!("difficulty:         {} (budget {} XP)", args.difficulty, budget);
    println!("catalog:            {} ({} monsters)", args.catalog, catalog.len());
    println!();
    println!("empty encounters:   {}", empty);
    println!("on target:          {:.1}%", per(on_target as f64) * 100.0);
    println!("avg monsters:       {:.2}", per(count_total as f64));
    println!("avg budget fill:    {:.1}%", per(fill_total) * 100.0);
    println!("avg adjusted XP:    {:.0}", per(adjusted_total as f64));
    println!();
    println!("rated as:");
    for (rating, n) in &ratings {
        println!("  {:<10} {:>6}  {:>5.1}%", rating.to_string(), n, per(*n as f64) * 100.0);
    }

    Ok(())
}
