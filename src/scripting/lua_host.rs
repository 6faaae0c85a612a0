use mlua::{
    AnyUserData, FromLuaMulti, Lua, MultiValue, UserData, UserDataMethods, Value, Variadic,
};
use tracing::debug;

use super::{bad_guid, guid_from_arg, guid_to_int, invoke, ScriptWorld, SharedWorld};
use crate::coerce::ArgValue;
use crate::command::Operation;
use crate::dispatch::BotDispatcher;
use crate::engine::{ItemRef, ObjectGuid, PlayerRef};
use crate::error::BotError;
use crate::projection::BotValue;

#[derive(Clone)]
struct LuaCreature {
    guid: ObjectGuid,
    world: SharedWorld,
    dispatcher: BotDispatcher,
}

#[derive(Clone)]
struct LuaPlayer(PlayerRef);

#[derive(Clone, Copy)]
struct LuaItem(ItemRef);

impl LuaCreature {
    fn call(&self, lua: &Lua, operation: Operation, args: &[Value]) -> mlua::Result<MultiValue> {
        let args: Vec<ArgValue> = args.iter().map(arg_from_lua).collect();
        let frame = invoke(&self.world, &self.dispatcher, self.guid, operation, &args)
            .map_err(lua_error)?;
        match frame {
            None => Ok(MultiValue::new()),
            Some(value) => Ok(MultiValue::from_vec(vec![value_to_lua(lua, value)?])),
        }
    }
}

impl UserData for LuaCreature {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("GetGUID", |_, this, ()| Ok(guid_to_int(this.guid)));
        for operation in Operation::ALL {
            methods.add_method(operation.name(), move |lua, this, args: Variadic<Value>| {
                this.call(lua, operation, &args)
            });
        }
    }
}

impl UserData for LuaPlayer {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("GetGUID", |_, this, ()| Ok(guid_to_int(this.0.guid)));
        methods.add_method("GetName", |_, this, ()| Ok(this.0.name.clone()));
    }
}

impl UserData for LuaItem {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("GetGUID", |_, this, ()| Ok(guid_to_int(this.0.guid)));
        methods.add_method("GetEntry", |_, this, ()| Ok(this.0.entry));
    }
}

fn userdata_arg(data: &AnyUserData) -> ArgValue {
    if let Ok(item) = data.borrow::<LuaItem>() {
        return ArgValue::Item(item.0);
    }
    if data.is::<LuaCreature>() {
        ArgValue::Other("Creature")
    } else if data.is::<LuaPlayer>() {
        ArgValue::Other("Player")
    } else {
        ArgValue::Other("userdata")
    }
}

fn arg_from_lua(value: &Value) -> ArgValue {
    match value {
        Value::Nil => ArgValue::Nil,
        Value::Boolean(b) => ArgValue::Bool(*b),
        Value::Integer(i) => ArgValue::Int(*i),
        Value::Number(n) => ArgValue::Num(*n),
        Value::String(s) => ArgValue::Str(s.to_string_lossy().to_string()),
        Value::UserData(data) => userdata_arg(data),
        other => ArgValue::Other(other.type_name()),
    }
}

fn value_to_lua(lua: &Lua, value: BotValue) -> mlua::Result<Value> {
    Ok(match value {
        BotValue::Bool(b) => Value::Boolean(b),
        BotValue::Integer(i) => Value::Integer(i),
        BotValue::Float(f) => Value::Number(f64::from(f)),
        BotValue::Guid(guid) => Value::Integer(guid_to_int(guid)),
        BotValue::Player(player) => Value::UserData(lua.create_userdata(LuaPlayer(player))?),
        BotValue::Item(item) => Value::UserData(lua.create_userdata(LuaItem(item))?),
        BotValue::Text(text) => Value::String(lua.create_string(&text)?),
    })
}

fn lua_error(err: BotError) -> mlua::Error {
    mlua::Error::RuntimeError(err.to_string())
}

/// A Lua state with the bot surface installed.
pub struct LuaBotHost {
    lua: Lua,
}

impl LuaBotHost {
    pub fn new(world: SharedWorld, dispatcher: BotDispatcher) -> mlua::Result<Self> {
        let lua = Lua::new();
        install_globals(&lua, world, dispatcher)?;
        Ok(Self { lua })
    }

    pub fn run(&self, name: &str, source: &str) -> mlua::Result<()> {
        debug!(script = name, "running lua script");
        self.lua.load(source).set_name(name).exec()
    }

    pub fn eval<R: FromLuaMulti>(&self, source: &str) -> mlua::Result<R> {
        self.lua.load(source).eval()
    }
}

fn install_globals(lua: &Lua, world: SharedWorld, dispatcher: BotDispatcher) -> mlua::Result<()> {
    let globals = lua.globals();

    let creature_world = world.clone();
    let get_creature_fn = lua.create_function(move |_lua, guid: Value| {
        let arg = arg_from_lua(&guid);
        let guid = guid_from_arg(&arg)
            .ok_or_else(|| mlua::Error::RuntimeError(bad_guid("GetCreatureByGUID", &arg)))?;
        if !creature_world.borrow().creature_exists(guid) {
            return Ok(None);
        }
        Ok(Some(LuaCreature {
            guid,
            world: creature_world.clone(),
            dispatcher,
        }))
    })?;
    globals.set("GetCreatureByGUID", get_creature_fn)?;

    let get_player_fn = lua.create_function(move |_lua, guid: Value| {
        let arg = arg_from_lua(&guid);
        let guid = guid_from_arg(&arg)
            .ok_or_else(|| mlua::Error::RuntimeError(bad_guid("GetPlayerByGUID", &arg)))?;
        Ok(world.borrow().find_player(guid).map(LuaPlayer))
    })?;
    globals.set("GetPlayerByGUID", get_player_fn)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EntityAccessor, EquipmentSlot, ItemTemplate, ROLE_TANK};
    use crate::roster::{BotBrain, BotRoster, BotSpawn};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn roster() -> BotRoster {
        let mut roster = BotRoster::new();
        roster.register_template(ItemTemplate {
            entry: 1001,
            name: "Valorous Chestguard".to_string(),
            item_level: 213,
            inventory_type: 5,
            required_level: 80,
        });
        roster.spawn_player(ObjectGuid(1), "Jaina");
        roster.give_item(ObjectGuid(1), 1001);
        roster.spawn_bot(BotSpawn {
            guid: ObjectGuid(100),
            entry: 70001,
            name: "Aldric".to_string(),
            class: 1,
            owner: Some(ObjectGuid(1)),
            brain: Some(BotBrain::new(80, 1, ROLE_TANK)),
        });
        roster.spawn_bot(BotSpawn {
            guid: ObjectGuid(101),
            entry: 70002,
            name: "Wanderer".to_string(),
            class: 8,
            owner: None,
            brain: Some(BotBrain::new(80, 2, 0)),
        });
        roster.spawn_creature(ObjectGuid(200), 3100, "Kobold Miner");
        roster
    }

    fn host() -> (Rc<RefCell<BotRoster>>, LuaBotHost) {
        let roster = Rc::new(RefCell::new(roster()));
        let world: SharedWorld = roster.clone();
        let host = LuaBotHost::new(world, BotDispatcher::default()).expect("lua host");
        (roster, host)
    }

    #[test]
    fn method_syntax_reaches_the_dispatcher() {
        let (_, host) = host();
        let (is_bot, tank, class): (bool, bool, u8) = host
            .eval(
                r#"
                local bot = GetCreatureByGUID(100)
                return bot:IsNPCBot(), bot:IsBotTank(), bot:GetBotClass()
                "#,
            )
            .expect("eval");
        assert!(is_bot);
        assert!(tank);
        assert_eq!(class, 1);
    }

    #[test]
    fn not_applicable_is_an_empty_frame() {
        let (_, host) = host();
        let counts: (usize, usize, bool) = host
            .eval(
                r#"
                local free = GetCreatureByGUID(101)
                local kobold = GetCreatureByGUID(200)
                return select('#', free:GetBotEquipment(5)),
                       select('#', kobold:IsBotTank()),
                       kobold:IsNPCBot()
                "#,
            )
            .expect("eval");
        assert_eq!(counts, (0, 0, false));
    }

    #[test]
    fn equip_by_entry_then_query_through_lua() {
        let (roster, host) = host();
        let entry: u32 = host
            .eval(
                r#"
                local bot = GetCreatureByGUID(100)
                assert(bot:BotEquipItem(1001, 5) == true)
                return bot:GetBotEquipment(5):GetEntry()
                "#,
            )
            .expect("eval");
        assert_eq!(entry, 1001);
        assert_eq!(roster.borrow().bot_average_item_level(ObjectGuid(100)), 213.0);
    }

    #[test]
    fn item_guids_survive_lua_numbers() {
        let (roster, host) = host();
        let guid: i64 = host
            .eval(
                r#"
                local bot = GetCreatureByGUID(100)
                bot:BotEquipItem(1001, 5)
                return bot:GetBotEquipment(5):GetGUID()
                "#,
            )
            .expect("eval");
        let chest = EquipmentSlot::new(5).expect("slot");
        let item = roster
            .borrow()
            .bot_equipment(ObjectGuid(100), chest)
            .expect("equipped");
        assert_eq!(guid, item.guid.raw() as i64);
    }

    #[test]
    fn equipped_items_cannot_be_equipped_twice() {
        let (roster, host) = host();
        let err = host
            .run(
                "twice.lua",
                r#"
                local bot = GetCreatureByGUID(100)
                assert(bot:BotEquipItem(1001, 5) == true)
                bot:BotEquipItem(1001, 12)
                "#,
            )
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("bad argument #2 to 'BotEquipItem' (owner Jaina carries no item with entry 1001)"));
        assert!(roster.borrow().backpack(ObjectGuid(1)).is_empty());
    }

    #[test]
    fn owner_comes_back_as_player_userdata() {
        let (_, host) = host();
        let name: String = host
            .eval("return GetCreatureByGUID(100):GetBotOwner():GetName()")
            .expect("eval");
        assert_eq!(name, "Jaina");
        let player_name: String = host
            .eval("return GetPlayerByGUID(1):GetName()")
            .expect("eval");
        assert_eq!(player_name, "Jaina");
    }

    #[test]
    fn unknown_guids_give_nil() {
        let (_, host) = host();
        let missing: bool = host
            .eval("return GetCreatureByGUID(999) == nil and GetPlayerByGUID(999) == nil")
            .expect("eval");
        assert!(missing);
    }

    #[test]
    fn argument_errors_raise_with_position() {
        let (_, host) = host();
        let err = host
            .run("slot.lua", "GetCreatureByGUID(100):BotEquipItem(1001, 99)")
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("bad argument #3 to 'BotEquipItem' (valid equipment slot expected, got 99)"));

        let err = host
            .run("type.lua", "GetCreatureByGUID(100):GetBotStat('strength')")
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("bad argument #2 to 'GetBotStat' (uint8 expected, got string)"));
    }

    #[test]
    fn scripts_can_catch_errors_with_pcall() {
        let (_, host) = host();
        let caught: bool = host
            .eval(
                r#"
                local ok, err = pcall(function()
                    return GetCreatureByGUID(100):BotUnequipItem(20)
                end)
                return not ok and string.find(tostring(err), "BotUnequipItem", 1, true) ~= nil
                "#,
            )
            .expect("eval");
        assert!(caught);
    }
}
