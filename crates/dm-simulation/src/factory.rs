//! Creating mobs and items from named templates.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use dm_core::{
    Combat, EntityId, EntityKind, Identity, Location, Position, Stats, World,
};
use dm_mechanics::DiceExpr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FactoryError {
    #[error("unknown template '{0}'")]
    UnknownTemplate(String),

    #[error("template '{template}' is invalid: {reason}")]
    InvalidTemplate { template: String, reason: String },
}

/// Creates entities from templates. Used by the respawn system.
pub trait EntityFactory: Send + Sync + std::fmt::Debug {
    fn spawn_mob(
        &self,
        world: &World,
        template: &str,
        room: EntityId,
        now: u64,
    ) -> Result<EntityId, FactoryError>;

    fn spawn_item(
        &self,
        world: &World,
        template: &str,
        room: EntityId,
        now: u64,
    ) -> Result<EntityId, FactoryError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct MobTemplate {
    pub name: String,
    pub keywords: Vec<String>,
    pub stats: Stats,
    pub weapon: String,
    pub attack_cooldown: u64,
}

impl MobTemplate {
    pub fn new(name: impl Into<String>, stats: Stats, weapon: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keywords: Vec::new(),
            stats,
            weapon: weapon.into(),
            attack_cooldown: 1,
        }
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cooldown(mut self, ticks: u64) -> Self {
        self.attack_cooldown = ticks;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemTemplate {
    pub name: String,
    pub keywords: Vec<String>,
}

impl ItemTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keywords: Vec::new(),
        }
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }
}

/// Built-in [`EntityFactory`] over in-memory template maps.
///
/// Ids are derived from the template name and a running serial, so two
/// factories fed the same calls produce the same ids.
#[derive(Debug, Default)]
pub struct TemplateFactory {
    mobs: HashMap<String, MobTemplate>,
    items: HashMap<String, ItemTemplate>,
    serial: AtomicU64,
}

impl TemplateFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mob(mut self, key: impl Into<String>, template: MobTemplate) -> Self {
        self.mobs.insert(key.into(), template);
        self
    }

    pub fn with_item(mut self, key: impl Into<String>, template: ItemTemplate) -> Self {
        self.items.insert(key.into(), template);
        self
    }

    pub fn mob_template(&self, key: &str) -> Option<&MobTemplate> {
        self.mobs.get(key)
    }

    fn next_id(&self, kind: EntityKind, template: &str) -> EntityId {
        let serial = self.serial.fetch_add(1, Ordering::Relaxed);
        EntityId::named(kind, &format!("{template}#{serial}"))
    }
}

impl EntityFactory for TemplateFactory {
    fn spawn_mob(
        &self,
        world: &World,
        template: &str,
        room: EntityId,
        now: u64,
    ) -> Result<EntityId, FactoryError> {
        let mob = self
            .mobs
            .get(template)
            .ok_or_else(|| FactoryError::UnknownTemplate(template.to_string()))?;
        DiceExpr::parse(&mob.weapon).map_err(|e| FactoryError::InvalidTemplate {
            template: template.to_string(),
            reason: e.to_string(),
        })?;

        let id = self.next_id(EntityKind::Mob, template);
        world.insert(
            id,
            Identity::new(mob.name.clone())
                .with_keywords(mob.keywords.clone())
                .with_template(template),
        );
        world.insert(id, mob.stats.clone());
        world.insert(
            id,
            Combat::with_weapon(mob.weapon.clone()).with_cooldown(mob.attack_cooldown),
        );
        world.insert(id, Position::Standing);
        // Location last: the mob becomes visible in the room fully formed.
        world.insert(id, Location::new(room, now));
        Ok(id)
    }

    fn spawn_item(
        &self,
        world: &World,
        template: &str,
        room: EntityId,
        now: u64,
    ) -> Result<EntityId, FactoryError> {
        let item = self
            .items
            .get(template)
            .ok_or_else(|| FactoryError::UnknownTemplate(template.to_string()))?;
        let id = self.next_id(EntityKind::Item, template);
        world.insert(
            id,
            Identity::new(item.name.clone())
                .with_keywords(item.keywords.clone())
                .with_template(template),
        );
        world.insert(id, Location::new(room, now));
        Ok(id)
    }
}
