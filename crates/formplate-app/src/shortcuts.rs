//! Keyboard shortcut registry and documentation.

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub shift: bool,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(key: &'static str, ctrl: bool, shift: bool, description: &'static str) -> Self {
        Self {
            key,
            ctrl,
            shift,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+A").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }
}

/// Registry of the designer canvas shortcuts.
///
/// None of them fire while a text field has focus or a field is edited in
/// place (except Escape, which leaves editing).
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new("A", true, false, "Select all fields on the page"),
            Shortcut::new("Delete", false, false, "Delete selected fields"),
            Shortcut::new("Backspace", false, false, "Delete selected fields"),
            Shortcut::new("Escape", false, false, "Clear selection or stop editing"),
            Shortcut::new("Arrows", false, false, "Move selected fields by 1 mm"),
            Shortcut::new("Arrows", false, true, "Move selected fields by 0.1 mm"),
            Shortcut::new("Click", false, true, "Toggle a field in the selection"),
            Shortcut::new("Double-click", false, false, "Edit a field in place"),
        ]
    }

    /// Print all shortcuts to console.
    pub fn print_all() {
        println!("\n=== Keyboard Shortcuts ===");
        for shortcut in Self::all() {
            println!("  {:20} {}", shortcut.format(), shortcut.description);
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        assert_eq!(Shortcut::new("A", true, false, "").format(), "Ctrl+A");
        assert_eq!(Shortcut::new("Arrows", false, true, "").format(), "Shift+Arrows");
    }

    #[test]
    fn test_registry_lists_select_all() {
        assert!(ShortcutRegistry::all().iter().any(|s| s.ctrl && s.key == "A"));
    }
}
