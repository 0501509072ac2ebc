use smol_str::SmolStr;

/// The signed-in user the editor runs as
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoginUser {
    pub code: SmolStr,
    pub locale: SmolStr,
}

impl LoginUser {
    pub fn new(code: impl Into<SmolStr>, locale: impl Into<SmolStr>) -> Self {
        Self {
            code: code.into(),
            locale: locale.into(),
        }
    }
}
