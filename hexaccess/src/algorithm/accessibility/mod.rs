mod accessibility_assigner;

pub use accessibility_assigner::AccessibilityAssigner;
