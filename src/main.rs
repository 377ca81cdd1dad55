// src/main.rs
// Native demo: two renderers share the "fx" group, a third sits in its own.
// Run with RUST_LOG=debug to watch groups being created and torn down.

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    demo::setup_diagnostics();
    demo::run()
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use anyhow::Context;
    use log::{info, LevelFilter};
    use slop_instancing::{
        Color, GroupRegistry, InstanceConfig, InstancedMaterial, MaterialSource, PropertyKind,
        PropertyValue, RenderTarget, Snapshot, TextureHandle,
    };

    const AUTHORED: &str = r#"{
        "group_key": "fx",
        "initialize_from_material": true,
        "properties": [
            { "name": "_Color", "value": { "kind": "Color", "value": { "r": 1.0, "g": 1.0, "b": 1.0, "a": 1.0 } } },
            { "name": "_FillAmount", "value": { "kind": "Float", "value": 0.0 } }
        ]
    }"#;

    pub fn setup_diagnostics() {
        env_logger::Builder::new()
            .filter_level(if cfg!(debug_assertions) {
                LevelFilter::Debug
            } else {
                LevelFilter::Warn
            })
            .format_timestamp_millis()
            .format_target(false)
            .parse_default_env()
            .init();
    }

    /// Base material every renderer shares.
    struct BarMaterial;

    impl MaterialSource for BarMaterial {
        fn has_property(&self, name: &str) -> bool {
            matches!(name, "_Color" | "_FillAmount")
        }
        fn get_float(&self, _name: &str) -> f32 {
            1.0
        }
        fn get_color(&self, _name: &str) -> Color {
            Color::RED
        }
        fn get_vector(&self, _name: &str) -> glam::Vec4 {
            glam::Vec4::ZERO
        }
        fn get_int(&self, _name: &str) -> i32 {
            0
        }
        fn get_texture(&self, _name: &str) -> TextureHandle {
            TextureHandle::NONE
        }
    }

    /// Prints every block it receives instead of drawing.
    struct ConsoleRenderer {
        name: &'static str,
        enabled: AtomicBool,
        material: Arc<dyn MaterialSource>,
    }

    impl ConsoleRenderer {
        fn new(name: &'static str, material: Arc<dyn MaterialSource>) -> Arc<Self> {
            Arc::new(Self {
                name,
                enabled: AtomicBool::new(true),
                material,
            })
        }
    }

    impl RenderTarget for ConsoleRenderer {
        fn is_active_and_enabled(&self) -> bool {
            self.enabled.load(Ordering::Relaxed)
        }

        fn apply_property_block(&self, block: &Snapshot) {
            let props: Vec<String> = block
                .iter()
                .map(|p| format!("{}={}", p.name, p.value))
                .collect();
            info!("[{}] {}", self.name, props.join(" "));
        }

        fn shared_material(&self) -> Option<Arc<dyn MaterialSource>> {
            Some(self.material.clone())
        }
    }

    pub fn run() -> anyhow::Result<()> {
        let registry = GroupRegistry::shared();
        let material: Arc<dyn MaterialSource> = Arc::new(BarMaterial);
        let config = InstanceConfig::from_json_str(AUTHORED).context("authored config")?;

        let renderers = [
            ConsoleRenderer::new("health-a", material.clone()),
            ConsoleRenderer::new("health-b", material.clone()),
            ConsoleRenderer::new("mana", material),
        ];
        let mut members: Vec<InstancedMaterial> = renderers
            .iter()
            .map(|r| {
                let target: Arc<dyn RenderTarget> = r.clone();
                InstancedMaterial::new(registry.clone(), config.clone(), Some(target))
            })
            .collect();
        for m in &mut members {
            m.on_activated();
        }

        members[2].change_group_key("mana");
        members[2].set_color("_Color", Color::rgba(0.2, 0.4, 1.0, 1.0), true)?;

        members[0].set_float("_FillAmount", 0.25, true)?;
        renderers[1].enabled.store(false, Ordering::Relaxed);
        members[0].set_float("_FillAmount", 0.75, true)?;
        renderers[1].enabled.store(true, Ordering::Relaxed);
        members[1].apply_to_render_target();

        let fill = members[1].property("_FillAmount", PropertyKind::Float)?;
        anyhow::ensure!(fill == PropertyValue::Float(0.75), "fx out of sync: {fill}");
        {
            let reg = registry.read();
            info!("{} groups live, 'fx' has {} members", reg.group_count(), reg.member_count("fx"));
        }

        for m in &mut members {
            m.on_deactivated();
        }
        info!("{} groups live after shutdown", registry.read().group_count());
        Ok(())
    }
}
