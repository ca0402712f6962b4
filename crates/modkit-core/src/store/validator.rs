//! Plugin content validation

/// Structural check applied to plugin content before it reaches the store.
///
/// Implementations decide what counts as plugin-shaped content; the
/// install path itself never changes per plugin format.
pub trait ContentValidator: Send + Sync {
    /// Returns true when the content looks like a loadable plugin.
    fn validate(&self, content: &str) -> bool;
}

/// Default check: the file must define a class and reference the
/// `BaseModule` extension contract.
///
/// This rejects obviously non-plugin payloads (HTML error pages, empty
/// bodies); it makes no attempt to actually parse the file.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseModuleValidator;

impl ContentValidator for BaseModuleValidator {
    fn validate(&self, content: &str) -> bool {
        content.contains("class") && content.contains("BaseModule")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plugin_shaped_content() {
        let content = "class EchoModule(BaseModule):\n    pass\n";
        assert!(BaseModuleValidator.validate(content));
    }

    #[test]
    fn test_rejects_missing_markers() {
        assert!(!BaseModuleValidator.validate("<html>404 not found</html>"));
        assert!(!BaseModuleValidator.validate("class Unrelated:\n    pass\n"));
        assert!(!BaseModuleValidator.validate("BaseModule mentioned, no definition"));
        assert!(!BaseModuleValidator.validate(""));
    }
}
