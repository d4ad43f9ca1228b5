use crate::skin::SkinDescriptor;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rotation {
    pub yaw: f64,
    pub pitch: f64,
}

/// Initial NPC configuration. Consumed once by the factory; changing a copy
/// afterwards has no effect on a spawned NPC.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub name: String,
    pub skin: SkinDescriptor,
    pub position: Vec3,
    pub yaw: f64,
    pub pitch: f64,
    pub scale: f64,
    pub immobile: bool,
    pub vulnerable: bool,
}

impl Settings {
    pub fn new(name: impl Into<String>, skin: SkinDescriptor) -> Self {
        Self {
            name: name.into(),
            skin,
            position: Vec3::default(),
            yaw: 0.0,
            pitch: 0.0,
            scale: 1.0,
            immobile: false,
            vulnerable: false,
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, yaw: f64, pitch: f64) -> Self {
        self.yaw = yaw;
        self.pitch = pitch;
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_immobile(mut self, immobile: bool) -> Self {
        self.immobile = immobile;
        self
    }

    pub fn with_vulnerable(mut self, vulnerable: bool) -> Self {
        self.vulnerable = vulnerable;
        self
    }

    pub fn rotation(&self) -> Rotation {
        Rotation {
            yaw: self.yaw,
            pitch: self.pitch,
        }
    }
}
