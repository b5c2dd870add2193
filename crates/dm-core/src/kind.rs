//! The closed registry of component kinds.
//!
//! Every component type is tied to a [`ComponentKind`] at compile time via
//! the [`Component`] trait, which also resolves its typed store inside a
//! [`World`]. String names are only used at the serialization boundary.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::component::{
    AttackRequest, Combat, FleeRequest, Identity, Location, MovementRequest, Position, Stats,
};
use crate::error::{CoreError, CoreResult};
use crate::room::Room;
use crate::store::ComponentStore;
use crate::world::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Identity,
    Location,
    Room,
    Stats,
    Combat,
    Position,
    MovementRequest,
    AttackRequest,
    FleeRequest,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 9] = [
        Self::Identity,
        Self::Location,
        Self::Room,
        Self::Stats,
        Self::Combat,
        Self::Position,
        Self::MovementRequest,
        Self::AttackRequest,
        Self::FleeRequest,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Location => "location",
            Self::Room => "room",
            Self::Stats => "stats",
            Self::Combat => "combat",
            Self::Position => "position",
            Self::MovementRequest => "movement_request",
            Self::AttackRequest => "attack_request",
            Self::FleeRequest => "flee_request",
        }
    }

    pub fn parse(s: &str) -> CoreResult<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s.trim())
            .ok_or_else(|| CoreError::UnknownComponentKind(s.to_string()))
    }

    fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A set of component kinds, stored as a bitmask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ComponentSet(u32);

impl ComponentSet {
    pub const EMPTY: ComponentSet = ComponentSet(0);

    pub fn of(kinds: &[ComponentKind]) -> Self {
        kinds.iter().fold(Self::EMPTY, |set, kind| set.with(*kind))
    }

    #[must_use]
    pub fn with(self, kind: ComponentKind) -> Self {
        Self(self.0 | kind.bit())
    }

    #[must_use]
    pub fn without(self, kind: ComponentKind) -> Self {
        Self(self.0 & !kind.bit())
    }

    #[must_use]
    pub fn union(self, other: ComponentSet) -> Self {
        Self(self.0 | other.0)
    }

    pub fn insert(&mut self, kind: ComponentKind) {
        *self = self.with(kind);
    }

    pub fn remove(&mut self, kind: ComponentKind) {
        *self = self.without(kind);
    }

    pub fn contains(self, kind: ComponentKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// True if every kind in `required` is present in `self`.
    pub fn contains_all(self, required: ComponentSet) -> bool {
        self.0 & required.0 == required.0
    }

    pub fn intersects(self, other: ComponentSet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = ComponentKind> {
        ComponentKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }
}

impl FromIterator<ComponentKind> for ComponentSet {
    fn from_iter<I: IntoIterator<Item = ComponentKind>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, |set, kind| set.with(kind))
    }
}

impl fmt::Display for ComponentSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(ComponentKind::name).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

/// Type-erased component value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ComponentValue {
    Identity(Identity),
    Location(Location),
    Room(Room),
    Stats(Stats),
    Combat(Combat),
    Position(Position),
    MovementRequest(MovementRequest),
    AttackRequest(AttackRequest),
    FleeRequest(FleeRequest),
}

impl ComponentValue {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Identity(_) => ComponentKind::Identity,
            Self::Location(_) => ComponentKind::Location,
            Self::Room(_) => ComponentKind::Room,
            Self::Stats(_) => ComponentKind::Stats,
            Self::Combat(_) => ComponentKind::Combat,
            Self::Position(_) => ComponentKind::Position,
            Self::MovementRequest(_) => ComponentKind::MovementRequest,
            Self::AttackRequest(_) => ComponentKind::AttackRequest,
            Self::FleeRequest(_) => ComponentKind::FleeRequest,
        }
    }
}

/// Implemented by every component type.
pub trait Component: Clone + fmt::Debug + Send + Sync + 'static {
    const KIND: ComponentKind;

    /// The world's store for this component type.
    fn store(world: &World) -> &ComponentStore<Self>;

    fn into_value(self) -> ComponentValue;

    fn from_value(value: ComponentValue) -> Option<Self>;

    fn view(value: &ComponentValue) -> Option<&Self>;

    fn view_mut(value: &mut ComponentValue) -> Option<&mut Self>;
}

macro_rules! register_component {
    ($ty:ident, $field:ident) => {
        impl Component for $ty {
            const KIND: ComponentKind = ComponentKind::$ty;

            fn store(world: &World) -> &ComponentStore<Self> {
                &world.stores().$field
            }

            fn into_value(self) -> ComponentValue {
                ComponentValue::$ty(self)
            }

            fn from_value(value: ComponentValue) -> Option<Self> {
                match value {
                    ComponentValue::$ty(inner) => Some(inner),
                    _ => None,
                }
            }

            fn view(value: &ComponentValue) -> Option<&Self> {
                match value {
                    ComponentValue::$ty(inner) => Some(inner),
                    _ => None,
                }
            }

            fn view_mut(value: &mut ComponentValue) -> Option<&mut Self> {
                match value {
                    ComponentValue::$ty(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

register_component!(Identity, identity);
register_component!(Location, location);
register_component!(Room, room);
register_component!(Stats, stats);
register_component!(Combat, combat);
register_component!(Position, position);
register_component!(MovementRequest, movement_request);
register_component!(AttackRequest, attack_request);
register_component!(FleeRequest, flee_request);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_parse_back() {
        for kind in ComponentKind::ALL {
            assert_eq!(ComponentKind::parse(kind.name()).unwrap(), kind);
        }
        assert!(ComponentKind::parse("inventory").is_err());
    }

    #[test]
    fn set_membership() {
        let set = ComponentSet::of(&[ComponentKind::Location, ComponentKind::MovementRequest]);
        assert!(set.contains(ComponentKind::Location));
        assert!(!set.contains(ComponentKind::Stats));
        assert_eq!(set.len(), 2);
        assert_eq!(set.without(ComponentKind::Location).len(), 1);
    }

    #[test]
    fn contains_all_is_superset_check() {
        let shape = ComponentSet::of(&[
            ComponentKind::Location,
            ComponentKind::Stats,
            ComponentKind::Combat,
        ]);
        assert!(shape.contains_all(ComponentSet::of(&[ComponentKind::Stats, ComponentKind::Combat])));
        assert!(shape.contains_all(ComponentSet::EMPTY));
        assert!(!shape.contains_all(ComponentSet::of(&[ComponentKind::AttackRequest])));
    }

    #[test]
    fn set_display_lists_names_in_kind_order() {
        let set: ComponentSet = [ComponentKind::Combat, ComponentKind::Identity]
            .into_iter()
            .collect();
        assert_eq!(set.to_string(), "{identity, combat}");
    }

    #[test]
    fn value_round_trips_through_component_trait() {
        let pos = Position::Resting;
        let value = pos.into_value();
        assert_eq!(value.kind(), ComponentKind::Position);
        assert_eq!(Position::view(&value), Some(&Position::Resting));
        assert!(Stats::view(&value).is_none());
        assert_eq!(Position::from_value(value), Some(Position::Resting));
    }

    #[test]
    fn value_serializes_with_kind_tag() {
        let value = Position::Sleeping.into_value();
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"kind":"position","value":"sleeping"}"#);
    }
}
