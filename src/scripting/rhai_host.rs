use rhai::{Dynamic, Engine, EvalAltResult, Position, Variant, INT};
use tracing::debug;

use super::{
    bad_guid, env_u64, guid_from_arg, guid_to_int, invoke, ScriptWorld, SharedWorld,
    DEFAULT_RHAI_MAX_CALL_LEVELS, DEFAULT_RHAI_MAX_OPERATIONS,
};
use crate::coerce::ArgValue;
use crate::command::Operation;
use crate::dispatch::BotDispatcher;
use crate::engine::{ItemRef, ObjectGuid, PlayerRef};
use crate::error::BotError;
use crate::projection::BotValue;

type RhaiResult = Result<Dynamic, Box<EvalAltResult>>;

#[derive(Clone)]
struct ScriptCreature {
    guid: ObjectGuid,
    world: SharedWorld,
    dispatcher: BotDispatcher,
}

#[derive(Clone)]
struct ScriptPlayer(PlayerRef);

#[derive(Clone, Copy)]
struct ScriptItem(ItemRef);

impl ScriptCreature {
    fn call(&self, operation: Operation, args: &[Dynamic]) -> RhaiResult {
        let args: Vec<ArgValue> = args.iter().map(arg_from_dynamic).collect();
        let frame = invoke(&self.world, &self.dispatcher, self.guid, operation, &args)
            .map_err(rhai_error)?;
        Ok(frame.map_or(Dynamic::UNIT, value_to_dynamic))
    }
}

fn arg_from_dynamic(value: &Dynamic) -> ArgValue {
    if value.is_unit() {
        return ArgValue::Nil;
    }
    if let Ok(b) = value.as_bool() {
        return ArgValue::Bool(b);
    }
    if let Ok(i) = value.as_int() {
        return ArgValue::Int(i);
    }
    if let Ok(f) = value.as_float() {
        return ArgValue::Num(f);
    }
    if let Ok(s) = value.clone().into_immutable_string() {
        return ArgValue::Str(s.to_string());
    }
    if let Some(item) = value.clone().try_cast::<ScriptItem>() {
        return ArgValue::Item(item.0);
    }
    if value.is::<ScriptCreature>() {
        ArgValue::Other("Creature")
    } else if value.is::<ScriptPlayer>() {
        ArgValue::Other("Player")
    } else {
        ArgValue::Other(value.type_name())
    }
}

fn value_to_dynamic(value: BotValue) -> Dynamic {
    match value {
        BotValue::Bool(b) => Dynamic::from_bool(b),
        BotValue::Integer(i) => Dynamic::from_int(i),
        BotValue::Float(f) => Dynamic::from_float(f64::from(f)),
        BotValue::Guid(guid) => Dynamic::from_int(guid_to_int(guid)),
        BotValue::Player(player) => Dynamic::from(ScriptPlayer(player)),
        BotValue::Item(item) => Dynamic::from(ScriptItem(item)),
        BotValue::Text(text) => Dynamic::from(text),
    }
}

fn rhai_error(err: BotError) -> Box<EvalAltResult> {
    EvalAltResult::ErrorRuntime(err.to_string().into(), Position::NONE).into()
}

fn guid_param(function: &str, value: &Dynamic) -> Result<ObjectGuid, Box<EvalAltResult>> {
    let arg = arg_from_dynamic(value);
    guid_from_arg(&arg)
        .ok_or_else(|| EvalAltResult::ErrorRuntime(bad_guid(function, &arg).into(), Position::NONE).into())
}

/// Widest call registered for any operation. Arguments past an operation's
/// shape are ignored, as in Lua.
const MAX_SCRIPT_ARITY: usize = 3;

/// Registers `operation` for every arity up to [`MAX_SCRIPT_ARITY`], so a short
/// call reaches coercion and fails there with the missing position.
fn register_operation(engine: &mut Engine, operation: Operation) {
    let name = operation.name();
    debug_assert!(operation.shape().len() <= MAX_SCRIPT_ARITY);
    engine.register_fn(name, move |c: &mut ScriptCreature| c.call(operation, &[]));
    engine.register_fn(name, move |c: &mut ScriptCreature, a: Dynamic| {
        c.call(operation, &[a])
    });
    engine.register_fn(name, move |c: &mut ScriptCreature, a: Dynamic, b: Dynamic| {
        c.call(operation, &[a, b])
    });
    engine.register_fn(
        name,
        move |c: &mut ScriptCreature, a: Dynamic, b: Dynamic, extra: Dynamic| {
            c.call(operation, &[a, b, extra])
        },
    );
}

fn make_rhai_engine(world: SharedWorld, dispatcher: BotDispatcher) -> Engine {
    let mut engine = Engine::new();
    let max_ops = env_u64("NPCBOT_RHAI_MAX_OPERATIONS", DEFAULT_RHAI_MAX_OPERATIONS).max(10_000);
    let max_call_levels =
        env_u64("NPCBOT_RHAI_MAX_CALL_LEVELS", DEFAULT_RHAI_MAX_CALL_LEVELS as u64).max(8);
    engine.set_max_operations(max_ops);
    engine.set_max_call_levels(usize::try_from(max_call_levels).unwrap_or(DEFAULT_RHAI_MAX_CALL_LEVELS));

    engine
        .register_type_with_name::<ScriptCreature>("Creature")
        .register_type_with_name::<ScriptPlayer>("Player")
        .register_type_with_name::<ScriptItem>("Item");

    engine.register_fn("GetGUID", |c: &mut ScriptCreature| guid_to_int(c.guid));
    engine.register_fn("GetGUID", |p: &mut ScriptPlayer| guid_to_int(p.0.guid));
    engine.register_fn("GetName", |p: &mut ScriptPlayer| p.0.name.clone());
    engine.register_fn("GetGUID", |i: &mut ScriptItem| guid_to_int(i.0.guid));
    engine.register_fn("GetEntry", |i: &mut ScriptItem| INT::from(i.0.entry));
    for operation in Operation::ALL {
        register_operation(&mut engine, operation);
    }

    let creature_world = world.clone();
    engine.register_fn("GetCreatureByGUID", move |guid: Dynamic| -> RhaiResult {
        let guid = guid_param("GetCreatureByGUID", &guid)?;
        if !creature_world.borrow().creature_exists(guid) {
            return Ok(Dynamic::UNIT);
        }
        Ok(Dynamic::from(ScriptCreature {
            guid,
            world: creature_world.clone(),
            dispatcher,
        }))
    });
    engine.register_fn("GetPlayerByGUID", move |guid: Dynamic| -> RhaiResult {
        let guid = guid_param("GetPlayerByGUID", &guid)?;
        Ok(world
            .borrow()
            .find_player(guid)
            .map_or(Dynamic::UNIT, |player| Dynamic::from(ScriptPlayer(player))))
    });

    engine
}

/// A Rhai engine with the bot surface registered.
pub struct RhaiBotHost {
    engine: Engine,
}

impl RhaiBotHost {
    pub fn new(world: SharedWorld, dispatcher: BotDispatcher) -> Self {
        Self {
            engine: make_rhai_engine(world, dispatcher),
        }
    }

    pub fn run(&self, name: &str, source: &str) -> Result<(), Box<EvalAltResult>> {
        debug!(script = name, "running rhai script");
        self.engine.run(source)
    }

    pub fn eval<T: Variant + Clone>(&self, source: &str) -> Result<T, Box<EvalAltResult>> {
        self.engine.eval(source)
    }
}
