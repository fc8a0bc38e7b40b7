use bitflags::bitflags;

bitflags! {
    /// Global shader features that can be toggled at runtime.
    pub struct ShaderDefines: u32 {
        const PHONG_SHADING = 1 << 0;
        const SPECULAR_EFFECT = 1 << 1;
        const SHADOW_EFFECT = 1 << 2;
        const NORMALS = 1 << 3;
    }
}

impl ShaderDefines {
    /// Every toggleable define along with its preprocessor name.
    pub const NAMED: [(ShaderDefines, &'static str); 4] = [
        (Self::PHONG_SHADING, "PHONG_SHADING"),
        (Self::SPECULAR_EFFECT, "SPECULAR_EFFECT"),
        (Self::SHADOW_EFFECT, "SHADOW_EFFECT"),
        (Self::NORMALS, "NORMALS"),
    ];

    /// Preprocessor name of a single define.
    pub fn name(self) -> Option<&'static str> {
        Self::NAMED
            .iter()
            .find(|(define, _)| *define == self)
            .map(|(_, name)| *name)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::NAMED
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(define, _)| *define)
    }
}

/// Whether shaders were compiled with the currently enabled defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinesState {
    Clean,
    Dirty,
}

/// The set of enabled global shader defines.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderingOptions {
    enabled: ShaderDefines,
    state: DefinesState,
}

impl Default for RenderingOptions {
    /// Everything enabled, shaders not compiled yet.
    fn default() -> Self {
        Self::new(ShaderDefines::all())
    }
}

impl RenderingOptions {
    pub fn new(enabled: ShaderDefines) -> Self {
        Self {
            enabled,
            state: DefinesState::Dirty,
        }
    }

    pub fn enabled(&self) -> ShaderDefines {
        self.enabled
    }

    pub fn is_enabled(&self, define: ShaderDefines) -> bool {
        self.enabled.contains(define)
    }

    /// Toggles defines. Only actual changes make the options dirty.
    pub fn set(&mut self, define: ShaderDefines, enabled: bool) {
        let previous = self.enabled;
        self.enabled.set(define, enabled);
        if self.enabled != previous {
            self.state = DefinesState::Dirty;
        }
    }

    pub fn state(&self) -> DefinesState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state == DefinesState::Dirty
    }

    pub fn mark_clean(&mut self) {
        self.state = DefinesState::Clean;
    }

    /// Names of the disabled defines, which shaders get compiled without.
    pub fn omitted_names(&self) -> Vec<&'static str> {
        ShaderDefines::NAMED
            .iter()
            .filter(|(define, _)| !self.enabled.contains(*define))
            .map(|(_, name)| *name)
            .collect()
    }
}
