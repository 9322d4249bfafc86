//! Projection of decoded entities onto a match view.
//!
//! Consumers dispatch on [`ClassKind`], resolved when the schema is loaded,
//! and on interned property ids resolved once per class registry.

use std::collections::BTreeMap;

use schema::{ClassKind, ClassRegistry, PropId};

use crate::entity::{Entity, Vec3};
use crate::packet_entities::DecodedPacketEntities;
use crate::registry::EntityRegistry;

/// World extents.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WorldBounds {
    pub min: Vec3,
    pub max: Vec3,
}

/// Per-player state derived from entity properties.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayerView {
    pub entity_index: u16,
    pub health: i64,
    pub max_health: i64,
    pub position: Vec3,
}

#[derive(Debug, Clone, Copy, Default)]
struct Keys {
    world_mins: Option<PropId>,
    world_maxs: Option<PropId>,
    health: Option<PropId>,
    max_health: Option<PropId>,
    origin_xy: [Option<PropId>; 2],
    origin_z: [Option<PropId>; 2],
}

impl Keys {
    fn resolve(classes: &ClassRegistry) -> Self {
        let id = |owner: &str, name: &str| classes.find_prop(owner, name).map(|def| def.id);
        Self {
            world_mins: id("DT_WORLD", "m_WorldMins"),
            world_maxs: id("DT_WORLD", "m_WorldMaxs"),
            health: id("DT_BasePlayer", "m_iHealth"),
            max_health: id("DT_BasePlayer", "m_iMaxHealth"),
            origin_xy: [
                id("DT_TFLocalPlayerExclusive", "m_vecOrigin"),
                id("DT_TFNonLocalPlayerExclusive", "m_vecOrigin"),
            ],
            origin_z: [
                id("DT_TFLocalPlayerExclusive", "m_vecOrigin[2]"),
                id("DT_TFNonLocalPlayerExclusive", "m_vecOrigin[2]"),
            ],
        }
    }
}

/// Match-level view built up packet by packet.
#[derive(Debug, Clone, Default)]
pub struct MatchView {
    keys: Keys,
    world: Option<WorldBounds>,
    players: BTreeMap<u16, PlayerView>,
}

impl MatchView {
    #[must_use]
    pub fn new(classes: &ClassRegistry) -> Self {
        Self {
            keys: Keys::resolve(classes),
            world: None,
            players: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn world(&self) -> Option<&WorldBounds> {
        self.world.as_ref()
    }

    #[must_use]
    pub fn player(&self, entity_index: u16) -> Option<&PlayerView> {
        self.players.get(&entity_index)
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerView> {
        self.players.values()
    }

    /// Applies the changes of one decoded packet.
    ///
    /// Entities deleted by the packet are skipped.
    pub fn apply(&mut self, entities: &EntityRegistry, decoded: &DecodedPacketEntities) {
        for change in &decoded.changes {
            let Some(entity) = entities.get(change.index) else {
                continue;
            };
            match entity.class.kind {
                ClassKind::World => self.apply_world(entity),
                ClassKind::Player => self.apply_player(entity, &change.changed),
                ClassKind::Other => {}
            }
        }
    }

    fn apply_world(&mut self, entity: &Entity) {
        let vector = |id: Option<PropId>| {
            id.and_then(|id| entity.property_by_id(id))
                .and_then(|prop| prop.value.as_vector())
        };
        if let (Some(min), Some(max)) = (vector(self.keys.world_mins), vector(self.keys.world_maxs)) {
            self.world = Some(WorldBounds { min, max });
        }
    }

    fn apply_player(&mut self, entity: &Entity, changed: &[PropId]) {
        let keys = self.keys;
        let player = self
            .players
            .entry(entity.index)
            .or_insert_with(|| PlayerView {
                entity_index: entity.index,
                ..PlayerView::default()
            });

        for id in changed {
            let Some(prop) = entity.property_by_id(*id) else {
                continue;
            };
            let id = Some(*id);
            if id == keys.health {
                player.health = prop.value.as_int().unwrap_or(player.health);
            } else if id == keys.max_health {
                player.max_health = prop.value.as_int().unwrap_or(player.max_health);
            } else if keys.origin_xy.contains(&id) {
                if let Some(v) = prop.value.as_vector() {
                    player.position.x = v.x;
                    player.position.y = v.y;
                }
            } else if keys.origin_z.contains(&id) {
                if let Some(z) = prop.value.as_float() {
                    player.position.z = z;
                }
            }
        }
    }
}
