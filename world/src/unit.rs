//! Moving, damageable actors with an order queue.

use std::collections::VecDeque;

use prey_arena_core::{
    angle_of, ActorAlias, ActorId, ActorKind, Event, Message, MessageRoutingRules, OrderClass,
    OrderKind, Team, UnitFlag, UnitIdentity, UnitType, UnitTypeName, Vec2, WeaponTypeName,
};
use tracing::debug;

use crate::{
    actor::{drain_mailbox, Actor},
    context::Context,
    Body, Order, WeaponActor, WorldError,
};

/// Boolean unit states.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UnitFlags {
    /// Current motion is externally imposed.
    pub impacted: bool,
    /// Fatal damage was received.
    pub dying: bool,
}

impl UnitFlags {
    /// Value of a single flag.
    #[must_use]
    pub const fn get(&self, flag: UnitFlag) -> bool {
        match flag {
            UnitFlag::Impacted => self.impacted,
            UnitFlag::Dying => self.dying,
        }
    }
}

/// Runtime instance of a unit type.
#[derive(Debug)]
pub struct UnitActor {
    id: ActorId,
    unit_type: &'static UnitType,
    team: Team,
    hitpoints: f32,
    facing_angle: f32,
    flags: UnitFlags,
    weapons: Vec<ActorId>,
    equipped_weapon: Option<ActorId>,
    orders: VecDeque<Order>,
    pending_death: Option<Message>,
}

impl UnitActor {
    /// Registers a unit with a body at `position` and queues its default
    /// weapons.
    pub(crate) fn spawn(
        ctx: &mut Context<'_>,
        unit_type: UnitTypeName,
        position: Vec2,
        team: Team,
    ) -> ActorId {
        let template = unit_type.unit_type();
        let id = ctx.directory.register(ActorKind::Unit);
        ctx.engine.spawn_body(
            id,
            Body {
                position,
                velocity: Vec2::ZERO,
                size: Vec2::splat(template.size),
                mass: template.mass,
            },
        );

        let unit = Self {
            id,
            unit_type: template,
            team,
            hitpoints: template.hitpoints,
            facing_angle: 0.0,
            flags: UnitFlags::default(),
            weapons: Vec::new(),
            equipped_weapon: None,
            orders: VecDeque::new(),
            pending_death: None,
        };
        let identity = unit.identity();
        ctx.directory.checkin(id, Actor::Unit(unit));

        for weapon in template.default_weapons {
            ctx.publish(
                Message::AddWeapon { weapon: *weapon },
                MessageRoutingRules::to_actor(id),
            );
        }

        ctx.engine.emit(Event::UnitSpawned {
            unit: identity,
            position,
        });
        debug!(unit = %id, ?unit_type, ?team, ?position, "spawned unit");
        id
    }

    /// Actor identifier.
    #[must_use]
    pub fn id(&self) -> ActorId {
        self.id
    }

    /// Template the unit was spawned from.
    #[must_use]
    pub fn unit_type(&self) -> &'static UnitType {
        self.unit_type
    }

    /// Side the unit fights for.
    #[must_use]
    pub fn team(&self) -> Team {
        self.team
    }

    /// Remaining hitpoints, always within `0..=max`.
    #[must_use]
    pub fn hitpoints(&self) -> f32 {
        self.hitpoints
    }

    /// Facing angle in radians.
    #[must_use]
    pub fn facing_angle(&self) -> f32 {
        self.facing_angle
    }

    /// Boolean unit states.
    #[must_use]
    pub fn flags(&self) -> UnitFlags {
        self.flags
    }

    /// Owned weapons; the list rotates when cycling.
    #[must_use]
    pub fn weapons(&self) -> &[ActorId] {
        &self.weapons
    }

    /// Currently equipped weapon.
    #[must_use]
    pub fn equipped_weapon(&self) -> Option<ActorId> {
        self.equipped_weapon
    }

    /// Order queue; the head is the active order.
    #[must_use]
    pub fn orders(&self) -> &VecDeque<Order> {
        &self.orders
    }

    /// Identity used in notifications about the unit.
    #[must_use]
    pub fn identity(&self) -> UnitIdentity {
        UnitIdentity {
            actor: self.id,
            unit_type: self.unit_type.name,
            team: self.team,
        }
    }

    /// Runs one frame: settle impact, die when due, drain mail, then
    /// progress the head order.
    ///
    /// Orders run while the unit is back in the directory so their checks
    /// can inspect it.
    pub(crate) fn update(id: ActorId, ctx: &mut Context<'_>) -> Result<(), WorldError> {
        let mut unit = match ctx.directory.checkout(id) {
            Some(Actor::Unit(unit)) => unit,
            Some(other) => {
                ctx.directory.checkin(id, other);
                return Err(WorldError::UnexpectedKind {
                    actor: id,
                    expected: ActorKind::Unit,
                });
            }
            None => return Ok(()),
        };

        unit.settle_impact(ctx);
        if unit.flags.dying && !unit.flags.impacted {
            unit.die(ctx);
            return Ok(());
        }

        let drained = drain_mailbox(id, ctx, |message, ctx| unit.handle_message(message, ctx));
        let mut orders = std::mem::take(&mut unit.orders);
        ctx.directory.checkin(id, Actor::Unit(unit));
        drained?;

        let mut progressed = Ok(());
        if let Some(head) = orders.front_mut() {
            progressed = head.try_to_progress(ctx).map(|_| ());
            if head.is_complete() {
                let _ = orders.pop_front();
            }
        }
        if let Some(unit) = ctx.directory.unit_mut(id) {
            unit.orders = orders;
        }
        progressed
    }

    fn settle_impact(&mut self, ctx: &Context<'_>) {
        if !self.flags.impacted {
            return;
        }
        let settled = ctx
            .engine
            .body(self.id)
            .map_or(true, |body| body.velocity.length() < ctx.config.impact_settle_speed);
        if settled {
            self.flags.impacted = false;
        }
    }

    fn handle_message(&mut self, message: Message, ctx: &mut Context<'_>) -> Result<(), WorldError> {
        match message {
            Message::AddWeapon { weapon } => self.add_weapon(weapon, ctx),
            Message::ImpactUnit { force, origin } => self.impact(force, origin, ctx)?,
            Message::DamageUnit {
                damaging_actor,
                damage,
            } => self.take_damage(damaging_actor, damage, ctx),
            Message::ChangeVelocity {
                velocity,
                update_facing,
            } => {
                let body = ctx
                    .engine
                    .body_mut(self.id)
                    .ok_or(WorldError::MissingBody(self.id))?;
                body.velocity = velocity;
                if update_facing && velocity.length() > 0.0 {
                    self.facing_angle = angle_of(velocity);
                }
            }
            Message::ChangeFacingAngle { angle } => self.facing_angle = angle,
            Message::CycleEquippedWeapon => {
                if self.weapons.len() > 1 {
                    self.weapons.rotate_left(1);
                }
                if let Some(head) = self.weapons.first().copied() {
                    self.equip(head, ctx);
                }
            }
            Message::EquipWeapon { weapon } => self.equip(weapon, ctx),
            Message::IssueOrder { order } => self.enqueue_order(order),
            Message::FireWeapon { .. }
            | Message::ReloadWeapon
            | Message::WeaponEquipped
            | Message::WeaponUnequipped
            | Message::PlayerFiredWeapon { .. }
            | Message::UnitHasDied { .. }
            | Message::UnitRemoved { .. } => {}
        }
        Ok(())
    }

    fn add_weapon(&mut self, weapon_type: WeaponTypeName, ctx: &mut Context<'_>) {
        let weapon = WeaponActor::spawn(ctx, weapon_type, self);
        self.weapons.push(weapon);
        if self.equipped_weapon.is_none() {
            self.equip(weapon, ctx);
        }
    }

    fn equip(&mut self, weapon: ActorId, ctx: &mut Context<'_>) {
        if !self.weapons.contains(&weapon) || self.equipped_weapon == Some(weapon) {
            return;
        }
        if let Some(previous) = self.equipped_weapon.replace(weapon) {
            ctx.publish(
                Message::WeaponUnequipped,
                MessageRoutingRules::to_actor(previous),
            );
        }
        ctx.publish(Message::WeaponEquipped, MessageRoutingRules::to_actor(weapon));
        debug!(unit = %self.id, %weapon, "equipped weapon");
    }

    fn impact(&mut self, force: f32, origin: Vec2, ctx: &mut Context<'_>) -> Result<(), WorldError> {
        let position = ctx
            .engine
            .body(self.id)
            .ok_or(WorldError::MissingBody(self.id))?
            .position;
        self.flags.impacted = true;
        let direction = (position - origin).normalize_or_zero();
        ctx.engine.apply_impulse(self.id, direction * force);
        Ok(())
    }

    fn take_damage(&mut self, damaging_actor: ActorId, damage: f32, ctx: &Context<'_>) {
        if damage.is_nan() {
            return;
        }
        self.hitpoints = (self.hitpoints - damage).clamp(0.0, self.unit_type.hitpoints);

        if self.hitpoints <= 0.0 && !self.flags.dying {
            self.flags.dying = true;
            let killer = ctx
                .directory
                .unit(damaging_actor)
                .map(UnitActor::identity);
            self.pending_death = Some(Message::UnitHasDied {
                dead: self.identity(),
                killer,
            });
            debug!(unit = %self.id, killer = ?killer, "unit received fatal damage");
        }
    }

    /// Queues an order: movement replaces movement, actions jump the queue,
    /// and everything behind the new order starts over.
    fn enqueue_order(&mut self, kind: OrderKind) {
        let order = Order::new(kind, self.id);
        let index = match order.class() {
            OrderClass::Movement => {
                match self
                    .orders
                    .iter()
                    .position(|queued| queued.class() == OrderClass::Movement)
                {
                    Some(index) => {
                        self.orders[index] = order;
                        index
                    }
                    None => {
                        self.orders.push_back(order);
                        self.orders.len() - 1
                    }
                }
            }
            OrderClass::Action => {
                self.orders.push_front(order);
                0
            }
        };

        for behind in self.orders.iter_mut().skip(index + 1) {
            behind.reset_progress();
        }
    }

    fn die(self, ctx: &mut Context<'_>) {
        let identity = self.identity();
        if let Some(message) = self.pending_death.clone() {
            ctx.publish_to_aliases(message, &[ActorAlias::PlayerActor, ActorAlias::EnemyActor]);
        }
        ctx.engine.emit(Event::UnitDied { unit: identity });
        debug!(unit = %self.id, unit_type = ?identity.unit_type, "unit died");
        self.destroy(ctx);
    }

    /// Destroys the unit's weapons, body and registration.
    pub(crate) fn destroy(self, ctx: &mut Context<'_>) {
        for weapon in &self.weapons {
            ctx.destroy_actor(*weapon);
        }
        let _ = ctx.engine.remove_body(self.id);
        let _ = ctx.directory.unregister(self.id);
    }

    #[cfg(test)]
    pub(crate) fn set_hitpoints(&mut self, hitpoints: f32) {
        self.hitpoints = hitpoints;
    }

    #[cfg(test)]
    pub(crate) fn set_impacted(&mut self, impacted: bool) {
        self.flags.impacted = impacted;
    }
}
