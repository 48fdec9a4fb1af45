//! JNI bindings. Every entry point takes a JSON request string and returns
//! `{"ok":true,"result":...}` or `{"ok":false,"error":"..."}`.

use jni::objects::{JClass, JString};
use jni::sys::jstring;
use jni::JNIEnv;
use serde::Deserialize;
use serde_json::{json, Value};
use skirmish_engine::api::{self, EncounterRequest, SkirmishConfig};
use skirmish_engine::content::builtin_catalog;
use skirmish_engine::{
    parse_dice_expression, roll_attack, roll_d20, roll_damage, DamageType, Defenses, Dice,
};

pub const VERSION: &str = concat!("skirmish-ffi ", env!("CARGO_PKG_VERSION"));

fn ok(value: impl serde::Serialize) -> String {
    match serde_json::to_value(value) {
        Ok(result) => json!({ "ok": true, "result": result }).to_string(),
        Err(e) => err(e),
    }
}

fn err(e: impl std::fmt::Display) -> String {
    json!({ "ok": false, "error": e.to_string() }).to_string()
}

fn parse<T: for<'de> Deserialize<'de>>(input: &str) -> Result<T, String> {
    serde_json::from_str(input).map_err(|e| format!("invalid_config: {e}"))
}

fn dice_for(seed: Option<u64>) -> Dice {
    seed.map(Dice::from_seed).unwrap_or_else(Dice::from_entropy)
}

#[derive(Deserialize)]
struct RollRequest {
    #[serde(default)]
    seed: Option<u64>,
    /// A dice expression; omitted means a plain d20.
    #[serde(default)]
    expression: Option<String>,
    #[serde(default)]
    advantage: bool,
    #[serde(default)]
    disadvantage: bool,
    #[serde(default)]
    crit: bool,
}

pub fn roll_json(input: &str) -> String {
    let req: RollRequest = match parse(input) {
        Ok(r) => r,
        Err(e) => return err(e),
    };
    let mut dice = dice_for(req.seed);
    match req.expression {
        Some(text) => ok(parse_dice_expression(&text).roll(&mut dice, req.crit)),
        None => ok(roll_d20(&mut dice, req.advantage, req.disadvantage)),
    }
}

#[derive(Deserialize)]
struct AttackJson {
    #[serde(default)]
    seed: Option<u64>,
    bonus: i32,
    target_ac: i32,
    #[serde(default)]
    advantage: bool,
    #[serde(default)]
    disadvantage: bool,
}

pub fn attack_json(input: &str) -> String {
    match parse::<AttackJson>(input) {
        Ok(req) => {
            let mut dice = dice_for(req.seed);
            ok(roll_attack(
                &mut dice,
                req.bonus,
                req.target_ac,
                req.advantage,
                req.disadvantage,
            ))
        }
        Err(e) => err(e),
    }
}

#[derive(Deserialize)]
struct DamageJson {
    #[serde(default)]
    seed: Option<u64>,
    expression: String,
    #[serde(default)]
    damage_type: DamageType,
    #[serde(default)]
    crit: bool,
    #[serde(default)]
    defenses: Defenses,
}

pub fn damage_json(input: &str) -> String {
    match parse::<DamageJson>(input) {
        Ok(req) => {
            let mut dice = dice_for(req.seed);
            ok(roll_damage(
                &mut dice,
                &req.expression,
                req.damage_type,
                req.crit,
                req.defenses,
            ))
        }
        Err(e) => err(e),
    }
}

#[derive(Deserialize)]
struct GenerateJson {
    #[serde(flatten)]
    request: EncounterRequest,
    #[serde(default = "default_catalog")]
    catalog: String,
    #[serde(default)]
    seed: Option<u64>,
}

fn default_catalog() -> String {
    "srd_core".to_string()
}

pub fn generate_encounter_json(input: &str) -> String {
    let req: GenerateJson = match parse(input) {
        Ok(r) => r,
        Err(e) => return err(e),
    };
    let catalog = match builtin_catalog(&req.catalog) {
        Ok(c) => c,
        Err(e) => return err(format!("{e:#}")),
    };
    let mut dice = dice_for(req.seed);
    match api::generate_encounter(&req.request, &catalog, &mut dice) {
        Ok(enc) => ok(enc),
        Err(e) => err(e),
    }
}

#[derive(Deserialize)]
struct ClassifyJson {
    party_levels: Vec<i32>,
    adjusted_xp: u32,
}

pub fn classify_json(input: &str) -> String {
    match parse::<ClassifyJson>(input) {
        Ok(req) => ok(api::classify_difficulty(&req.party_levels, req.adjusted_xp)),
        Err(e) => err(e),
    }
}

pub fn simulate_skirmish_json(input: &str) -> String {
    let cfg: SkirmishConfig = match parse(input) {
        Ok(c) => c,
        Err(e) => return err(e),
    };
    match api::simulate_skirmish(cfg) {
        Ok(result) => ok(result),
        Err(e) => err(format!("{e:#}")),
    }
}

fn to_jstring(env: &JNIEnv, text: String) -> jstring {
    env.new_string(text)
        .map(|s| s.into_raw())
        .unwrap_or(std::ptr::null_mut())
}

fn call(mut env: JNIEnv, input: JString, f: fn(&str) -> String) -> jstring {
    let out = match env.get_string(&input) {
        // A panic must not unwind into the JVM.
        Ok(s) => {
            let text = String::from(s);
            std::panic::catch_unwind(|| f(&text)).unwrap_or_else(|_| err("internal_error"))
        }
        Err(e) => err(e),
    };
    to_jstring(&env, out)
}

#[no_mangle]
pub extern "system" fn Java_com_skirmish_Ffi_version(env: JNIEnv, _class: JClass) -> jstring {
    to_jstring(&env, VERSION.to_string())
}

#[no_mangle]
pub extern "system" fn Java_com_skirmish_Ffi_rollJson(
    env: JNIEnv,
    _class: JClass,
    json: JString,
) -> jstring {
    call(env, json, roll_json)
}

#[no_mangle]
pub extern "system" fn Java_com_skirmish_Ffi_attackJson(
    env: JNIEnv,
    _class: JClass,
    json: JString,
) -> jstring {
    call(env, json, attack_json)
}

#[no_mangle]
pub extern "system" fn Java_com_skirmish_Ffi_damageJson(
    env: JNIEnv,
    _class: JClass,
    json: JString,
) -> jstring {
    call(env, json, damage_json)
}

#[no_mangle]
pub extern "system" fn Java_com_skirmish_Ffi_generateEncounterJson(
    env: JNIEnv,
    _class: JClass,
    json: JString,
) -> jstring {
    call(env, json, generate_encounter_json)
}

#[no_mangle]
pub extern "system" fn Java_com_skirmish_Ffi_classifyJson(
    env: JNIEnv,
    _class: JClass,
    json: JString,
) -> jstring {
    call(env, json, classify_json)
}

#[no_mangle]
pub extern "system" fn Java_com_skirmish_Ffi_simulateSkirmishJson(
    env: JNIEnv,
    _class: JClass,
    json: JString,
) -> jstring {
    call(env, json, simulate_skirmish_json)
}
