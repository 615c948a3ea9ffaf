//! Name-based classification of temperature sensors.
//!
//! Every decision lives in [`RULES`]: a sensor on a device of a given class is
//! assigned the category of the first rule whose `any_of` set matches its
//! name and whose `none_of` set does not. Matching is a case-insensitive
//! substring test.

use crate::models::DeviceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Cpu,
    GpuCore,
    GpuHotspot,
    GpuGeneric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Cpu,
    Motherboard,
    Gpu,
}

impl DeviceClass {
    pub fn of(kind: DeviceKind) -> Option<Self> {
        match kind {
            DeviceKind::Cpu => Some(DeviceClass::Cpu),
            DeviceKind::Motherboard => Some(DeviceClass::Motherboard),
            k if k.is_gpu() => Some(DeviceClass::Gpu),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub device: DeviceClass,
    pub any_of: &'static [&'static str],
    pub none_of: &'static [&'static str],
    pub category: Category,
}

impl Rule {
    /// `name` must already be lowercase.
    fn matches(&self, name: &str) -> bool {
        self.any_of.iter().any(|needle| name.contains(needle))
            && !self.none_of.iter().any(|needle| name.contains(needle))
    }
}

/// Ordered: the first applicable rule wins. GPU rules are listed by tier
/// priority, so "GPU Hotspot" lands in the hotspot tier and not the generic one.
pub const RULES: &[Rule] = &[
    Rule {
        device: DeviceClass::Cpu,
        any_of: &["core", "package", "cpu", "tctl", "tdie", "ccd"],
        none_of: &[],
        category: Category::Cpu,
    },
    Rule {
        device: DeviceClass::Motherboard,
        any_of: &["cpu"],
        none_of: &["fan", "pump"],
        category: Category::Cpu,
    },
    Rule {
        device: DeviceClass::Gpu,
        any_of: &["core"],
        none_of: &[],
        category: Category::GpuCore,
    },
    Rule {
        device: DeviceClass::Gpu,
        any_of: &["hotspot", "junction"],
        none_of: &[],
        category: Category::GpuHotspot,
    },
    Rule {
        device: DeviceClass::Gpu,
        any_of: &["gpu", "memory"],
        none_of: &[],
        category: Category::GpuGeneric,
    },
];

pub fn classify(kind: DeviceKind, sensor_name: &str) -> Option<Category> {
    let class = DeviceClass::of(kind)?;
    let name = sensor_name.to_lowercase();
    RULES
        .iter()
        .filter(|rule| rule.device == class)
        .find(|rule| rule.matches(&name))
        .map(|rule| rule.category)
}

/// Last-resort CPU match, used only when no rule above produced a CPU value.
pub fn is_fallback_cpu(device_name: &str, sensor_name: &str) -> bool {
    let device = device_name.to_lowercase();
    let name = sensor_name.to_lowercase();

    (name.contains("temp") && (device.contains("cpu") || device.contains("processor")))
        || (name.contains("thermal") && !name.contains("gpu"))
        || name.starts_with("temp1")
        || name.starts_with("temp2")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_rule_names() {
        for name in ["Core #0", "CPU Package", "Tctl", "Tdie", "Tccd1", "CPU Total"] {
            assert_eq!(classify(DeviceKind::Cpu, name), Some(Category::Cpu), "{name}");
        }
        assert_eq!(classify(DeviceKind::Cpu, "Distance to TjMax"), None);
    }

    #[test]
    fn test_motherboard_excludes_fan_and_pump() {
        assert_eq!(classify(DeviceKind::Motherboard, "CPU"), Some(Category::Cpu));
        assert_eq!(classify(DeviceKind::Motherboard, "CPU Socket"), Some(Category::Cpu));
        assert_eq!(classify(DeviceKind::Motherboard, "CPU Fan"), None);
        assert_eq!(classify(DeviceKind::Motherboard, "CPU Pump"), None);
        assert_eq!(classify(DeviceKind::Motherboard, "System"), None);
    }

    #[test]
    fn test_gpu_tiers_first_match() {
        for kind in [DeviceKind::GpuNvidia, DeviceKind::GpuAmd, DeviceKind::GpuIntel] {
            assert_eq!(classify(kind, "GPU Core"), Some(Category::GpuCore));
            assert_eq!(classify(kind, "GPU Hotspot"), Some(Category::GpuHotspot));
            assert_eq!(classify(kind, "junction"), Some(Category::GpuHotspot));
            assert_eq!(classify(kind, "GPU Memory Junction"), Some(Category::GpuHotspot));
            assert_eq!(classify(kind, "GPU Memory"), Some(Category::GpuGeneric));
            assert_eq!(classify(kind, "edge"), None);
        }
    }

    #[test]
    fn test_other_devices_never_match() {
        assert_eq!(classify(DeviceKind::Other, "CPU Core"), None);
        assert_eq!(classify(DeviceKind::Other, "GPU Core"), None);
    }

    #[test]
    fn test_every_rule_reachable() {
        for rule in RULES {
            let kind = match rule.device {
                DeviceClass::Cpu => DeviceKind::Cpu,
                DeviceClass::Motherboard => DeviceKind::Motherboard,
                DeviceClass::Gpu => DeviceKind::GpuAmd,
            };
            for needle in rule.any_of {
                let category = classify(kind, &needle.to_uppercase());
                assert_eq!(category, Some(rule.category), "{needle}");
            }
        }
    }

    #[test]
    fn test_fallback_rules() {
        assert!(is_fallback_cpu("cpu_thermal", "Temperature"));
        assert!(is_fallback_cpu("Intel Processor", "temp"));
        assert!(is_fallback_cpu("acpitz", "Thermal Zone"));
        assert!(!is_fallback_cpu("acpitz", "GPU Thermal"));
        assert!(is_fallback_cpu("acpitz", "Temp1"));
        assert!(is_fallback_cpu("nvme", "temp2"));
        assert!(!is_fallback_cpu("nvme", "temp3"));
        assert!(!is_fallback_cpu("nvme", "Composite"));
    }
}
