//! Headless demo exercising every pool for a few simulated seconds

use std::error::Error;
use std::time::Duration;

use env_logger::Env;
use spawnpool::prelude::*;

const CONFIG: &str = r#"(
    pools: [
        (key: "soldier", capacity: 4),
        (key: "medkit", capacity: 2),
    ],
    projectiles: (
        per_key_capacity: 8,
        lifetime_seconds: 0.5,
        max_bounces: 2,
    ),
    spam: (
        interval_seconds: 0.1,
        effect_lifetime_seconds: 0.3,
    ),
)"#;

/// Hit points carried by pooled medkits
#[derive(Debug, Clone, Copy, PartialEq)]
struct Heal(f32);

impl Default for Heal {
    fn default() -> Self {
        Self(25.0)
    }
}

fn register_templates(scene: &mut Scene) {
    scene.templates.register(
        "soldier",
        Template::new("Soldier", |builder| {
            builder.add(Velocity::default());
        }),
    );
    scene.templates.register(
        "medkit",
        Template::new("Medkit", |builder| {
            builder.add(Heal(50.0));
        }),
    );
    scene.templates.register(
        "rifle_bullet",
        Template::new("Rifle Bullet", |builder| {
            builder.add(Projectile::new(30.0, 0.1));
        }),
    );
    scene.templates.register("impact_sparks", Template::empty("Impact Sparks"));
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = PoolConfig::from_ron_str(CONFIG)?;
    log::info!("Loaded pool config with {} pools", config.pools.len());

    let mut scene = Scene::new();
    register_templates(&mut scene);

    let soldier = AssetKey::new("soldier");
    let medkit = AssetKey::new("medkit");
    let capacity = |key: &AssetKey| config.pool(key).map_or(1, |settings| settings.capacity);

    let mut soldiers =
        GameObjectPool::from_registry(&scene.templates, &soldier, capacity(&soldier))?;
    let mut medkits =
        ComponentPool::<Heal>::from_registry(&scene.templates, &medkit, capacity(&medkit))?;
    let mut bullets = KeyedRingPool::new(config.projectiles.clone())?;
    let mut sparks = SpamProtectedInstantiator::from_settings(&config.spam);

    let rifle = AssetKey::new("rifle_bullet");
    let impact = AssetKey::new("impact_sparks");
    let frame = Duration::from_millis(16);

    for step in 0..240u32 {
        let t = step as f32 * frame.as_secs_f32();

        if step % 20 == 0 {
            let position = Vec3::new(t.sin() * 10.0, 0.0, t.cos() * 10.0);
            let trooper = soldiers.spawn_at(&mut scene, position, None)?;

            let aim = Vec3::new(-position.x, 0.0, -position.z);
            let bullet = bullets.spawn_and_fire(&mut scene, &rifle, position, aim, Some(trooper))?;
            if step % 40 == 0 {
                bullets.register_bounce(&mut scene, bullet)?;
            }
        }

        if step % 50 == 0 {
            let kit = medkits.spawn_at(&mut scene, Vec3::new(0.0, 1.0, 0.0), None)?;
            let heal = kit.get(&scene.world)?.0;
            log::debug!("Medkit {:?} heals {heal}", kit.entity());
        }

        // A grinding contact asks for sparks every frame
        sparks.instantiate(&mut scene, &impact, Vec3::ZERO, Some(Quat::IDENTITY))?;

        scene.tick(frame);
        for event in scene.events.drain() {
            log::trace!("{event:?}");
        }
    }

    log::info!("Soldiers: {:?}", soldiers.stats());
    log::info!("Medkits: {:?}", medkits.stats());
    log::info!("Bullets: {:?}", bullets.stats());
    log::info!("Sparks: {:?}", sparks.stats());

    let cleared = soldiers.clear(&mut scene, Duration::from_millis(50))
        + medkits.clear(&mut scene, Duration::ZERO);
    let torn_down = bullets.teardown(&mut scene);
    log::info!("Cleared {cleared} pooled instances, tearing down {torn_down} projectiles");

    while !scene.scheduler.is_empty() {
        scene.tick(frame);
    }
    log::info!("{} instances left in the scene", scene.world.len());

    Ok(())
}
