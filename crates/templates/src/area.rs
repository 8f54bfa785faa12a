/// Owning area handed to every entity created from a template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Area {
    name: String,
}

impl Area {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
