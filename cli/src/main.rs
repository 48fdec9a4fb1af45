use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use skirmish_engine::api::{self, EncounterRequest, SkirmishConfig};
use skirmish_engine::conditions::{condition_info, STANDARD_CONDITIONS};
use skirmish_engine::config::AppConfig;
use skirmish_engine::encounter::MonsterPick;
use skirmish_engine::xp::{encounter_xp, milestone_xp, quest_completion_xp, Milestone};
use skirmish_engine::{
    parse_dice_expression, roll_attack, roll_d20, roll_damage, telemetry, DamageType, Defenses,
    DiceExpr, Difficulty, Dice,
};

mod text;

#[derive(Copy, Clone, ValueEnum)]
enum Adv {
    Normal,
    Advantage,
    Disadvantage,
}

impl Adv {
    fn flags(self) -> (bool, bool) {
        match self {
            Adv::Normal => (false, false),
            Adv::Advantage => (true, false),
            Adv::Disadvantage => (false, true),
        }
    }
}

#[derive(Subcommand)]
enum Cmd {
    /// Roll a d20 several times with optional advantage/disadvantage
    Roll {
        /// RNG seed for determinism
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, value_enum, default_value_t = Adv::Normal)]
        adv: Adv,
        /// Number of rolls
        #[arg(long, default_value_t = 5)]
        rolls: u32,
    },
    /// Roll a dice expression such as 2d6+3
    Dice {
        expression: String,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Double the dice as on a critical hit
        #[arg(long)]
        crit: bool,
        /// Reject unreadable expressions instead of rolling 1d6
        #[arg(long)]
        strict: bool,
    },
    /// Roll one attack against an armor class
    Attack {
        #[arg(long, allow_hyphen_values = true)]
        bonus: i32,
        #[arg(long)]
        ac: i32,
        #[arg(long, value_enum, default_value_t = Adv::Normal)]
        adv: Adv,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Roll damage and apply resistance, immunity or vulnerability
    Damage {
        expression: String,
        #[arg(long = "type", default_value = "slashing")]
        damage_type: DamageType,
        #[arg(long)]
        crit: bool,
        #[arg(long)]
        resist: bool,
        #[arg(long)]
        immune: bool,
        #[arg(long)]
        vuln: bool,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long)]
        json: bool,
    },
    /// XP budget for a party at a difficulty
    Budget {
        /// Comma-separated party levels, e.g. 3,3,4
        #[arg(long, value_delimiter = ',', required = true, allow_hyphen_values = true)]
        levels: Vec<i32>,
        #[arg(long, default_value = "medium")]
        difficulty: Difficulty,
    },
    /// Generate a balanced encounter from a monster catalog
    Generate {
        #[arg(long, value_delimiter = ',', required = true, allow_hyphen_values = true)]
        levels: Vec<i32>,
        #[arg(long, default_value = "medium")]
        difficulty: Difficulty,
        /// Built-in catalog name
        #[arg(long, default_value = "srd_core")]
        catalog: String,
        /// Catalog file (JSON or YAML); overrides --catalog
        #[arg(long)]
        catalog_file: Option<PathBuf>,
        /// Restrict the pool to these monster ids
        #[arg(long, value_delimiter = ',')]
        monsters: Vec<String>,
        #[arg(long)]
        max: Option<u32>,
        #[arg(long)]
        min: Option<u32>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        json: bool,
    },
    /// Rate an adjusted XP total for a party
    Classify {
        #[arg(long, value_delimiter = ',', required = true, allow_hyphen_values = true)]
        levels: Vec<i32>,
        #[arg(long)]
        xp: u32,
    },
    /// Generate an encounter for a party and fight it out
    Skirmish {
        /// Skirmish config (JSON or YAML)
        #[arg(long)]
        config: PathBuf,
        /// Override the config's seed
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        json: bool,
    },
    /// List the standard conditions, or describe one
    Conditions { name: Option<String> },
    /// XP for defeated monsters, a milestone and a completed quest
    Xp {
        /// Defeated monsters as id or id:count, e.g. goblin:3,hobgoblin
        #[arg(long, value_delimiter = ',')]
        defeated: Vec<String>,
        #[arg(long, default_value = "srd_core")]
        catalog: String,
        #[arg(long)]
        catalog_file: Option<PathBuf>,
        /// minor, major or story
        #[arg(long)]
        milestone: Option<Milestone>,
        /// Quest level range
        #[arg(long, num_args = 2, value_names = ["MIN", "MAX"])]
        quest: Option<Vec<u32>>,
        /// Party size for the per-member split
        #[arg(long, default_value_t = 1)]
        party: usize,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Parser)]
#[command(name = "skirmish")]
#[command(about = "Dice, combat resolution and encounter generation")]
struct Cli {
    /// Diagnostic log filter (RUST_LOG takes precedence)
    #[arg(long, global = true, default_value = "warn")]
    log: String,
    /// Settings file with session and encounter defaults
    #[arg(long, global = true)]
    settings: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Cmd,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(&cli.log);
    let settings = match &cli.settings {
        Some(path) => {
            let cfg = text::read_doc::<AppConfig>(path)?;
            tracing::debug!(path = %path.display(), "loaded settings");
            cfg
        }
        None => AppConfig::default(),
    };

    match cli.cmd {
        Cmd::Roll { seed, adv, rolls } => {
            let (a, d) = adv.flags();
            let mut dice = Dice::from_seed(seed);
            for _ in 0..rolls {
                let roll = roll_d20(&mut dice, a, d);
                match roll.dropped {
                    Some(dropped) => println!("{} (dropped {})", roll.result, dropped),
                    None => println!("{}", roll.result),
                }
            }
        }
        Cmd::Dice {
            expression,
            seed,
            crit,
            strict,
        } => {
            let expr: DiceExpr = if strict {
                expression.parse()?
            } else {
                parse_dice_expression(&expression)
            };
            let mut dice = Dice::from_seed(seed);
            let roll = expr.roll(&mut dice, crit);
            println!(
                "{}: {:?} {:+} = {} (min {}, max {}, avg {})",
                expr,
                roll.rolls,
                roll.modifier,
                roll.total,
                expr.min(),
                expr.max(),
                expr.average()
            );
        }
        Cmd::Attack { bonus, ac, adv, seed } => {
            let (a, d) = adv.flags();
            let mut dice = Dice::from_seed(seed);
            let atk = roll_attack(&mut dice, bonus, ac, a, d);
            let outcome = if atk.crit {
                "CRIT!"
            } else if atk.crit_fail {
                "MISS (NAT1)"
            } else if atk.hit {
                "HIT"
            } else {
                "MISS"
            };
            println!(
                "d20={} total={} vs AC {} => {}",
                atk.d20.result, atk.total, atk.target_ac, outcome
            );
        }
        Cmd::Damage {
            expression,
            damage_type,
            crit,
            resist,
            immune,
            vuln,
            seed,
            json,
        } => {
            let defenses = Defenses {
                resistance: resist,
                immunity: immune,
                vulnerability: vuln,
            };
            let mut dice = Dice::from_seed(seed);
            let dmg = roll_damage(&mut dice, &expression, damage_type, crit, defenses);
            if json {
                println!("{}", serde_json::to_string_pretty(&dmg)?);
            } else {
                println!(
                    "{} {:?} base={} final={} {}",
                    dmg.dice, dmg.roll.rolls, dmg.base, dmg.final_damage, dmg.damage_type
                );
            }
        }
        Cmd::Budget { levels, difficulty } => {
            println!("{}", api::compute_budget(&levels, difficulty));
        }
        Cmd::Generate {
            levels,
            difficulty,
            catalog,
            catalog_file,
            monsters,
            max,
            min,
            seed,
            json,
        } => {
            let file = catalog_file.or_else(|| settings.catalog_path.as_ref().map(PathBuf::from));
            let catalog = text::load_catalog(file.as_deref(), &catalog)?;
            let request = EncounterRequest {
                party_levels: levels,
                difficulty,
                monsters,
                max_monsters: max.unwrap_or(settings.encounter.max_monsters),
                min_monsters: min.unwrap_or(settings.encounter.min_monsters),
            };
            let mut dice = match seed.or(settings.session.seed) {
                Some(seed) => Dice::from_seed(seed),
                None => Dice::from_entropy(),
            };
            let enc = api::generate_encounter(&request, &catalog, &mut dice)?;
            if enc.monsters.is_empty() {
                tracing::warn!(budget = enc.xp_budget, "no monsters fit the budget");
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&enc)?);
            } else {
                println!(
                    "{} encounter for party {:?} (budget {} XP)",
                    enc.difficulty, enc.party_levels, enc.xp_budget
                );
                for m in &enc.monsters {
                    println!(
                        "  {} x{}  (CR {}, {} XP each, AC {}, HP {})",
                        m.name, m.quantity, m.cr, m.xp, m.ac, m.hp
                    );
                }
                println!(
                    "total {} XP x{} = {} adjusted -> {}",
                    enc.total_xp,
                    enc.multiplier,
                    enc.adjusted_xp,
                    enc.rating()
                );
            }
        }
        Cmd::Classify { levels, xp } => {
            println!("{}", api::classify_difficulty(&levels, xp));
        }
        Cmd::Skirmish { config, seed, json } => {
            let mut cfg: SkirmishConfig = text::read_doc(&config)?;
            if let Some(seed) = seed {
                cfg.seed = seed;
            }
            let res = api::simulate_skirmish(cfg).context("running skirmish")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&res)?);
            } else {
                for line in &res.log {
                    println!("{line}");
                }
                println!("XP earned: {}", res.xp.total);
            }
        }
        Cmd::Conditions { name } => match name {
            Some(name) => match condition_info(&name) {
                Some(info) => println!("{}: {}", info.name, info.summary),
                None => bail!("unknown condition '{name}'"),
            },
            None => {
                for info in STANDARD_CONDITIONS {
                    println!("{:<14} {}", info.key, info.summary);
                }
            }
        },
        Cmd::Xp {
            defeated,
            catalog,
            catalog_file,
            milestone,
            quest,
            party,
            json,
        } => {
            let picks = if defeated.is_empty() {
                Vec::new()
            } else {
                let catalog = text::load_catalog(catalog_file.as_deref(), &catalog)?;
                defeated
                    .iter()
                    .map(|entry| {
                        let (id, count) = parse_defeated(entry)?;
                        Ok(MonsterPick::from_monster(catalog.get(id)?, count))
                    })
                    .collect::<Result<Vec<_>>>()?
            };
            let mut award = encounter_xp(&picks);
            let bonus_milestone = milestone.map(milestone_xp).unwrap_or(0);
            let bonus_quest = match quest.as_deref() {
                Some([min, max]) => quest_completion_xp(*min, *max),
                _ => 0,
            };
            award.total = award
                .total
                .saturating_add(bonus_milestone)
                .saturating_add(bonus_quest);
            if json {
                println!("{}", serde_json::to_string_pretty(&award)?);
            } else {
                for line in &award.breakdown {
                    println!(
                        "  {} x{} @ {} = {}",
                        line.name, line.quantity, line.xp_each, line.xp_total
                    );
                }
                if let Some(m) = milestone {
                    println!("  milestone {} = {}", m, bonus_milestone);
                }
                if bonus_quest > 0 {
                    println!("  quest completion = {}", bonus_quest);
                }
                println!(
                    "total {} XP, {} each for {} members",
                    award.total,
                    award.per_member(party),
                    party
                );
            }
        }
    }
    Ok(())
}

/// `goblin:3` or `goblin` (one).
fn parse_defeated(entry: &str) -> Result<(&str, u32)> {
    match entry.split_once(':') {
        Some((id, count)) => {
            let count = count
                .trim()
                .parse()
                .with_context(|| format!("bad monster count in '{entry}'"))?;
            Ok((id.trim(), count))
        }
        None => Ok((entry.trim(), 1)),
    }
}
