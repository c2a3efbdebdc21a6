//! Demo prototypes and the lifecycle facets they attach

use recycle_engine::foundation::math::Vec3;
use recycle_engine::pooling::{LifecycleFacet, Placement, Prototype, PrototypeLibrary, PrototypeRef};
use std::cell::Cell;
use std::rc::Rc;

/// Spawn counters shared by every probe
#[derive(Debug, Default)]
pub struct Telemetry {
    spawned: Cell<u64>,
    despawned: Cell<u64>,
    launch_impulse: Cell<Vec3>,
}

impl Telemetry {
    /// Total spawn notifications
    pub fn spawned(&self) -> u64 {
        self.spawned.get()
    }

    /// Total despawn notifications
    pub fn despawned(&self) -> u64 {
        self.despawned.get()
    }

    /// Sum of every launch velocity
    pub fn launch_impulse(&self) -> Vec3 {
        self.launch_impulse.get()
    }
}

/// Counts transitions into the shared telemetry
pub struct TelemetryProbe {
    telemetry: Rc<Telemetry>,
}

impl LifecycleFacet for TelemetryProbe {
    fn on_spawned(&mut self, _placement: &Placement) {
        self.telemetry.spawned.set(self.telemetry.spawned.get() + 1);
    }

    fn on_despawned(&mut self) {
        self.telemetry.despawned.set(self.telemetry.despawned.get() + 1);
    }

    fn label(&self) -> &str {
        "telemetry"
    }
}

/// Launch velocity derived from the spawn orientation
pub struct Ballistics {
    speed: f32,
    velocity: Vec3,
    telemetry: Rc<Telemetry>,
}

impl LifecycleFacet for Ballistics {
    fn on_spawned(&mut self, placement: &Placement) {
        self.velocity = placement.orientation * Vec3::z() * self.speed;
        let impulse = self.telemetry.launch_impulse.get() + self.velocity;
        self.telemetry.launch_impulse.set(impulse);
    }

    fn on_despawned(&mut self) {
        self.velocity = Vec3::zeros();
    }

    fn label(&self) -> &str {
        "ballistics"
    }
}

/// Bolt template; rejects non-positive muzzle speeds
pub struct BoltPrototype {
    muzzle_speed: f32,
    telemetry: Rc<Telemetry>,
}

impl Prototype for BoltPrototype {
    fn validate(&self) -> Result<(), String> {
        if self.muzzle_speed.is_finite() && self.muzzle_speed > 0.0 {
            Ok(())
        } else {
            Err(format!("muzzle speed must be positive, got {}", self.muzzle_speed))
        }
    }

    fn instantiate(&self) -> Vec<Box<dyn LifecycleFacet>> {
        vec![
            Box::new(Ballistics {
                speed: self.muzzle_speed,
                velocity: Vec3::zeros(),
                telemetry: Rc::clone(&self.telemetry),
            }),
            Box::new(TelemetryProbe {
                telemetry: Rc::clone(&self.telemetry),
            }),
        ]
    }
}

/// Prototypes addressable from the catalog config
pub fn prototype_library(telemetry: &Rc<Telemetry>, bolt_speed: f32) -> PrototypeLibrary {
    let mut library = PrototypeLibrary::new();

    library.register(
        "bolt",
        Rc::new(BoltPrototype {
            muzzle_speed: bolt_speed,
            telemetry: Rc::clone(telemetry),
        }),
    );

    let probe_only = |telemetry: &Rc<Telemetry>| -> PrototypeRef {
        let telemetry = Rc::clone(telemetry);
        Rc::new(move || -> Vec<Box<dyn LifecycleFacet>> {
            vec![Box::new(TelemetryProbe {
                telemetry: Rc::clone(&telemetry),
            })]
        })
    };
    library.register("spark", probe_only(telemetry));
    library.register("debris", probe_only(telemetry));

    library
}
