/// One meaningful line of a pipeline config file.
/// Blank lines and comments don't produce an item.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Item<'a> {
    /// `#Module Type` or `#Module Type AS label`
    Module { ty: &'a str, label: Option<&'a str> },
    /// `key=value` or `key: value`
    Property { key: &'a str, val: &'a str },
}

impl<'a> Item<'a> {
    pub fn module(ty: &'a str, label: Option<&'a str>) -> Self {
        Self::Module { ty, label }
    }

    pub fn property(key: &'a str, val: &'a str) -> Self {
        Self::Property { key, val }
    }
}
