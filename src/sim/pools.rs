//! Per-frame advance and sweep for the entity pools
//!
//! Every pool follows the same pattern: integrate `pos += vel * dt`, apply
//! pool-specific secondary effects to velocity/lifetime, then `retain` the
//! survivors. Nothing is removed by index while iterating.

use glam::Vec2;

use super::state::{Boss, Bullet, Enemy, Particle, Pickup};
use crate::consts::*;

/// Anything that moves with a velocity and has a circular hit area
pub trait Body {
    fn pos(&self) -> Vec2;
    fn pos_mut(&mut self) -> &mut Vec2;
    fn vel(&self) -> Vec2;
    fn radius(&self) -> f32;

    fn integrate(&mut self, dt: f32) {
        let vel = self.vel();
        *self.pos_mut() += vel * dt;
    }

    /// True once the body is fully beyond `margin` of the field
    fn outside(&self, width: f32, height: f32, margin: f32) -> bool {
        let p = self.pos();
        p.x < -margin || p.x > width + margin || p.y < -margin || p.y > height + margin
    }
}

macro_rules! impl_body {
    ($($ty:ty),*) => {
        $(impl Body for $ty {
            fn pos(&self) -> Vec2 { self.pos }
            fn pos_mut(&mut self) -> &mut Vec2 { &mut self.pos }
            fn vel(&self) -> Vec2 { self.vel }
            fn radius(&self) -> f32 { self.radius }
        })*
    };
}

impl_body!(Bullet, Enemy, Boss, Pickup);

impl Body for Particle {
    fn pos(&self) -> Vec2 {
        self.pos
    }
    fn pos_mut(&mut self) -> &mut Vec2 {
        &mut self.pos
    }
    fn vel(&self) -> Vec2 {
        self.vel
    }
    fn radius(&self) -> f32 {
        self.size
    }
}

/// Advance bullets, decay beam lifetimes, drop expired or off-screen shots
pub fn advance_bullets(bullets: &mut Vec<Bullet>, dt: f32, width: f32, height: f32) {
    for bullet in bullets.iter_mut() {
        bullet.prev_pos = bullet.pos;
        bullet.integrate(dt);
        if let Some(ttl) = bullet.ttl.as_mut() {
            *ttl -= dt;
        }
    }
    bullets.retain(|b| !b.consumed && !b.expired() && !b.outside(width, height, OFFSCREEN_MARGIN));
}

/// Advance falling pickups (gravity after the move)
pub fn advance_pickups(pickups: &mut Vec<Pickup>, dt: f32, gravity: f32, width: f32, height: f32) {
    for pickup in pickups.iter_mut() {
        pickup.integrate(dt);
        pickup.vel.y += gravity * dt;
    }
    pickups.retain(|p| !p.outside(width, height, OFFSCREEN_MARGIN));
}

/// Gravity pulling debris down, per second squared
pub const PARTICLE_GRAVITY: f32 = 40.0;

/// Advance particles, decay life, drop dead ones
pub fn advance_particles(particles: &mut Vec<Particle>, dt: f32) {
    for particle in particles.iter_mut() {
        particle.integrate(dt);
        particle.vel.y += PARTICLE_GRAVITY * dt;
        particle.life -= dt;
    }
    particles.retain(|p| p.life > 0.0);
}

/// Drop enemies that are dead or left the field.
///
/// Enemies enter from beyond the right edge, so that side gets extra room.
pub fn sweep_enemies(enemies: &mut Vec<Enemy>, width: f32, height: f32) {
    enemies.retain(|e| {
        e.hp > 0
            && e.pos.x >= -ENEMY_CULL_MARGIN
            && e.pos.x <= width + ENEMY_ENTRY_OFFSET + ENEMY_CULL_MARGIN * 3.0
            && e.pos.y >= -ENEMY_CULL_MARGIN
            && e.pos.y <= height + ENEMY_CULL_MARGIN
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::PickupKind;

    fn shot(x: f32, y: f32, vx: f32) -> Bullet {
        Bullet::player(Vec2::new(x, y), Vec2::new(vx, 0.0), 4.0)
    }

    #[test]
    fn test_bullets_integrate_and_track_prev() {
        let mut bullets = vec![shot(100.0, 100.0, 500.0)];
        advance_bullets(&mut bullets, 0.1, 960.0, 540.0);
        assert_eq!(bullets.len(), 1);
        assert!((bullets[0].pos.x - 150.0).abs() < 1e-4);
        assert_eq!(bullets[0].prev_pos, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_bullets_culled_offscreen_in_order() {
        let mut bullets = vec![
            shot(950.0, 10.0, 500.0),
            shot(10.0, 20.0, 500.0),
            shot(975.0, 30.0, 500.0),
            shot(20.0, 40.0, 500.0),
        ];
        advance_bullets(&mut bullets, 0.1, 960.0, 540.0);
        // Adjacent removals must not skip anything
        let ys: Vec<f32> = bullets.iter().map(|b| b.pos.y).collect();
        assert_eq!(ys, vec![20.0, 40.0]);
    }

    #[test]
    fn test_beam_expires() {
        let mut bullets = vec![Bullet::beam(Vec2::new(100.0, 100.0), Vec2::new(10.0, 0.0), 6.0, 0.15)];
        advance_bullets(&mut bullets, 0.1, 960.0, 540.0);
        assert_eq!(bullets.len(), 1);
        advance_bullets(&mut bullets, 0.1, 960.0, 540.0);
        assert!(bullets.is_empty());
    }

    #[test]
    fn test_pickup_gravity_after_move() {
        let mut pickups = vec![Pickup {
            id: 1,
            kind: PickupKind::Heal,
            pos: Vec2::new(500.0, 200.0),
            vel: Vec2::new(-80.0, -40.0),
            radius: 10.0,
        }];
        advance_pickups(&mut pickups, 0.5, 30.0, 960.0, 540.0);
        assert!((pickups[0].pos - Vec2::new(460.0, 180.0)).length() < 1e-4);
        assert!((pickups[0].vel.y - (-25.0)).abs() < 1e-4);
    }

    #[test]
    fn test_particles_die() {
        let mut particles = vec![
            Particle { pos: Vec2::ZERO, vel: Vec2::X, life: 0.05, color: 0, size: 2.0 },
            Particle { pos: Vec2::ZERO, vel: Vec2::X, life: 1.0, color: 0, size: 2.0 },
        ];
        advance_particles(&mut particles, 0.1);
        assert_eq!(particles.len(), 1);
        assert!((particles[0].life - 0.9).abs() < 1e-6);
    }
}
