#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Prey Arena simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative actor world, and pure systems. Actors never call each other
//! directly: they publish [`Message`] values with explicit
//! [`MessageRoutingRules`], and the world's broker enqueues them on the
//! mailboxes of every actor that passes the rules. Adapters feed the world
//! [`InputFrame`] values and observe the simulation through [`Event`]
//! notifications and read-only queries.

mod catalog;
mod geometry;

use std::fmt;

pub use catalog::{
    upgraded_value, UnitColor, UnitType, UnitTypeName, UpgradeLevels, UpgradeStep, WeaponStat,
    WeaponStats, WeaponType, WeaponTypeName, WeaponUpgrade,
};
pub use geometry::{angle_of, vector_from_angle, Aabb, Segment, SectorCoord};
pub use glam::Vec2;

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Prey Arena.";

/// Unique identifier assigned to every registered actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(u32);

impl ActorId {
    /// Creates a new actor identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Well-known names under which singleton actors register themselves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActorAlias {
    /// Actor tracking the human player's score and unit.
    PlayerActor,
    /// Director that spawns and commands enemy units.
    EnemyActor,
    /// Unit controlled by the human player.
    PlayerUnitActor,
    /// Actor answering path queries.
    PathingActor,
    /// Actor streaming world sectors around the player.
    WorldActor,
    /// Actor translating adapter input into orders.
    InputActor,
}

/// Discriminates the concrete behaviour behind an actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActorKind {
    /// A moving, damageable body with an order queue.
    Unit,
    /// A weapon owned by exactly one unit.
    Weapon,
    /// Player score keeper.
    Player,
    /// Enemy spawning director.
    Enemy,
    /// Sector streaming and obstacle generation.
    World,
    /// Grid path search with caching.
    Pathing,
    /// Input translation.
    Input,
}

/// Side a unit fights for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    /// Units controlled by the human player.
    Player,
    /// Units controlled by the enemy director.
    Enemy,
}

/// Boolean unit states that ability checks can inspect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnitFlag {
    /// Current motion is externally imposed rather than self-willed.
    Impacted,
    /// Fatal damage was received and removal waits for the impact to settle.
    Dying,
}

/// Eight-way movement direction; `Up` points toward +y.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Toward +y.
    Up,
    /// Toward +y and +x.
    UpRight,
    /// Toward +x.
    Right,
    /// Toward -y and +x.
    DownRight,
    /// Toward -y.
    Down,
    /// Toward -y and -x.
    DownLeft,
    /// Toward -x.
    Left,
    /// Toward +y and -x.
    UpLeft,
}

impl Direction {
    /// Combines two cardinal directions into a diagonal when they are perpendicular.
    #[must_use]
    pub const fn combine(self, other: Direction) -> Option<Direction> {
        match (self, other) {
            (Direction::Up, Direction::Left) | (Direction::Left, Direction::Up) => {
                Some(Direction::UpLeft)
            }
            (Direction::Up, Direction::Right) | (Direction::Right, Direction::Up) => {
                Some(Direction::UpRight)
            }
            (Direction::Down, Direction::Left) | (Direction::Left, Direction::Down) => {
                Some(Direction::DownLeft)
            }
            (Direction::Down, Direction::Right) | (Direction::Right, Direction::Down) => {
                Some(Direction::DownRight)
            }
            _ => None,
        }
    }

    /// Unit-length vector pointing in the direction.
    #[must_use]
    pub fn unit_vector(self) -> Vec2 {
        let raw = match self {
            Direction::Up => Vec2::new(0.0, 1.0),
            Direction::UpRight => Vec2::new(1.0, 1.0),
            Direction::Right => Vec2::new(1.0, 0.0),
            Direction::DownRight => Vec2::new(1.0, -1.0),
            Direction::Down => Vec2::new(0.0, -1.0),
            Direction::DownLeft => Vec2::new(-1.0, -1.0),
            Direction::Left => Vec2::new(-1.0, 0.0),
            Direction::UpLeft => Vec2::new(-1.0, 1.0),
        };
        raw.normalize()
    }

    /// Facing angle in radians matching [`Direction::unit_vector`].
    #[must_use]
    pub fn angle(self) -> f32 {
        angle_of(self.unit_vector())
    }
}

/// Identity of a unit captured when a message about it is built.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitIdentity {
    /// Actor identifier of the unit.
    pub actor: ActorId,
    /// Template the unit was spawned from.
    pub unit_type: UnitTypeName,
    /// Side the unit fought for.
    pub team: Team,
}

/// Data-only description of an order; the world turns it into a live order.
#[derive(Clone, Debug, PartialEq)]
pub enum OrderKind {
    /// Fires the equipped weapon toward a world point.
    Attack {
        /// World point to aim at.
        target: Vec2,
    },
    /// Keeps attacking a unit, closing the distance when out of range.
    AttackUnit {
        /// Unit to attack.
        target: ActorId,
    },
    /// Walks along a path until the target is within weapon range.
    MoveIntoAttackRange {
        /// Unit to approach.
        target: ActorId,
    },
    /// Keeps walking toward a unit.
    FollowUnit {
        /// Unit to follow.
        target: ActorId,
    },
    /// Keeps moving in a fixed direction.
    MoveInDirection {
        /// Direction of travel.
        direction: Direction,
    },
    /// Turns the unit to face a direction.
    FaceDirection {
        /// Direction to face.
        direction: Direction,
    },
    /// Halts self-willed motion.
    StopMoving,
    /// Reloads the equipped weapon.
    Reload,
    /// Switches to an owned weapon of the provided type.
    EquipWeapon {
        /// Weapon type to equip.
        weapon: WeaponTypeName,
    },
}

/// Queue discipline group an order belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderClass {
    /// Long-lived motion orders; at most one is queued at a time.
    Movement,
    /// Short actions pushed ahead of motion without clearing it.
    Action,
}

impl OrderKind {
    /// Queue discipline group of the order.
    #[must_use]
    pub const fn class(&self) -> OrderClass {
        match self {
            OrderKind::MoveInDirection { .. }
            | OrderKind::StopMoving
            | OrderKind::FollowUnit { .. }
            | OrderKind::MoveIntoAttackRange { .. } => OrderClass::Movement,
            OrderKind::Attack { .. }
            | OrderKind::AttackUnit { .. }
            | OrderKind::FaceDirection { .. }
            | OrderKind::Reload
            | OrderKind::EquipWeapon { .. } => OrderClass::Action,
        }
    }
}

/// Messages exchanged between actors.
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    /// Gives a unit a new weapon of the provided type.
    AddWeapon {
        /// Weapon type to create.
        weapon: WeaponTypeName,
    },
    /// Knocks a unit away from a point.
    ImpactUnit {
        /// Magnitude of the knockback force.
        force: f32,
        /// Point the force originates from.
        origin: Vec2,
    },
    /// Deals damage to a unit.
    DamageUnit {
        /// Unit responsible for the damage.
        damaging_actor: ActorId,
        /// Hitpoints to remove; negative values heal.
        damage: f32,
    },
    /// Replaces a unit's velocity.
    ChangeVelocity {
        /// New velocity in world units per frame.
        velocity: Vec2,
        /// Whether a non-zero velocity should also turn the unit.
        update_facing: bool,
    },
    /// Turns a unit to face an angle.
    ChangeFacingAngle {
        /// Facing angle in radians.
        angle: f32,
    },
    /// Rotates a unit's weapon list and equips the new head.
    CycleEquippedWeapon,
    /// Equips one of the unit's weapons.
    EquipWeapon {
        /// Weapon actor to equip.
        weapon: ActorId,
    },
    /// Queues an order on a unit.
    IssueOrder {
        /// Order to queue.
        order: OrderKind,
    },
    /// Fires a weapon toward a world point.
    FireWeapon {
        /// World point to aim at.
        target: Vec2,
    },
    /// Starts reloading a weapon.
    ReloadWeapon,
    /// Notifies a weapon that its owner equipped it.
    WeaponEquipped,
    /// Notifies a weapon that its owner put it away.
    WeaponUnequipped,
    /// Reports a shot fired by the player's team.
    PlayerFiredWeapon {
        /// Weapon type that fired.
        weapon: WeaponTypeName,
    },
    /// Reports that a unit died.
    UnitHasDied {
        /// Unit that died.
        dead: UnitIdentity,
        /// Unit that dealt the fatal damage, when it was still alive.
        killer: Option<UnitIdentity>,
    },
    /// Reports that a unit was streamed out with its sector.
    UnitRemoved {
        /// Unit that was removed.
        removed: UnitIdentity,
    },
}

/// Filters that select the recipients of a published message.
///
/// Every supplied filter must pass for an actor to receive the message. A
/// rule set without any filter delivers to nobody.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MessageRoutingRules {
    /// Explicit recipients.
    pub actor_ids: Option<Vec<ActorId>>,
    /// Restricts recipients to a single actor kind.
    pub actor_kind: Option<ActorKind>,
    /// Segments that must touch the recipient's footprint.
    pub intersecting: Option<Vec<Segment>>,
    /// Actors that never receive the message.
    pub exclude_actor_ids: Option<Vec<ActorId>>,
}

impl MessageRoutingRules {
    /// Rules addressed to an explicit list of actors.
    #[must_use]
    pub fn to(actor_ids: impl Into<Vec<ActorId>>) -> Self {
        Self {
            actor_ids: Some(actor_ids.into()),
            ..Self::default()
        }
    }

    /// Rules addressed to a single actor.
    #[must_use]
    pub fn to_actor(actor: ActorId) -> Self {
        Self::to(vec![actor])
    }

    /// Rules addressed to every actor whose footprint touches a segment.
    #[must_use]
    pub fn intersecting(segments: impl Into<Vec<Segment>>) -> Self {
        Self {
            intersecting: Some(segments.into()),
            ..Self::default()
        }
    }

    /// Rules addressed to every actor of a kind.
    #[must_use]
    pub fn of_kind(kind: ActorKind) -> Self {
        Self {
            actor_kind: Some(kind),
            ..Self::default()
        }
    }

    /// Adds actors that must never receive the message.
    #[must_use]
    pub fn excluding(mut self, actor_ids: impl Into<Vec<ActorId>>) -> Self {
        self.exclude_actor_ids = Some(actor_ids.into());
        self
    }

    /// Reports whether no filter was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actor_ids.is_none()
            && self.actor_kind.is_none()
            && self.intersecting.is_none()
            && self.exclude_actor_ids.is_none()
    }
}

/// Discrete keys the input layer reports to the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputKey {
    /// Move toward +y.
    Up,
    /// Move toward -x.
    Left,
    /// Move toward -y.
    Down,
    /// Move toward +x.
    Right,
    /// Reload the equipped weapon.
    Reload,
    /// Cycle to the next owned weapon.
    CycleWeapon,
    /// Equip the weapon assigned to a loadout slot.
    EquipSlot(usize),
}

/// Input edges observed by the adapter during one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputFrame {
    /// Keys that went down this frame.
    pub pressed: Vec<InputKey>,
    /// Keys that went up this frame.
    pub released: Vec<InputKey>,
    /// World point clicked to attack, if any.
    pub attack_target: Option<Vec2>,
}

impl InputFrame {
    /// Frame without any input edges.
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }

    /// Frame in which the provided keys went down.
    #[must_use]
    pub fn pressing(keys: impl Into<Vec<InputKey>>) -> Self {
        Self {
            pressed: keys.into(),
            ..Self::default()
        }
    }

    /// Frame in which the provided keys went up.
    #[must_use]
    pub fn releasing(keys: impl Into<Vec<InputKey>>) -> Self {
        Self {
            released: keys.into(),
            ..Self::default()
        }
    }

    /// Frame containing a single attack click.
    #[must_use]
    pub fn attacking(target: Vec2) -> Self {
        Self {
            attack_target: Some(target),
            ..Self::default()
        }
    }
}

/// Notifications broadcast to adapters after the world changes.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A new round began.
    RoundStarted {
        /// Zero-based index of the round.
        round: usize,
    },
    /// The current round finished.
    RoundEnded {
        /// Zero-based index of the round.
        round: usize,
        /// Total score earned during the round.
        total_score: u32,
    },
    /// A unit entered the world.
    UnitSpawned {
        /// Identity of the new unit.
        unit: UnitIdentity,
        /// Position the unit spawned at.
        position: Vec2,
    },
    /// A unit died and left the world.
    UnitDied {
        /// Identity of the dead unit.
        unit: UnitIdentity,
    },
    /// A unit left the world with its sector.
    UnitRemoved {
        /// Identity of the removed unit.
        unit: UnitIdentity,
    },
    /// A weapon fired; adapters play its sound and may draw the rays.
    WeaponFired {
        /// Weapon actor that fired.
        weapon: ActorId,
        /// Weapon type that fired.
        weapon_type: WeaponTypeName,
        /// Rays traced by the shot.
        rays: Vec<Segment>,
    },
    /// A weapon began reloading.
    ReloadStarted {
        /// Weapon actor that is reloading.
        weapon: ActorId,
        /// Weapon type that is reloading.
        weapon_type: WeaponTypeName,
    },
    /// The player crossed into another sector.
    SectorChanged {
        /// Sector the player left.
        from: SectorCoord,
        /// Sector the player entered.
        to: SectorCoord,
    },
    /// Obstacles were generated for a sector entering the window.
    SectorGenerated {
        /// Sector that was generated.
        sector: SectorCoord,
        /// Number of obstacles placed.
        obstacles: usize,
    },
}
