//! Template engine based on MiniJinja
//!
//! Two independent entry points, "render compose fragments" and "render
//! files", each build a fresh environment per call: helper templates are
//! registered first so scope templates can reach them via `include`, then
//! every scope template is parsed and executed against a shared data view
//! (`Values`, `Env`, `Release`, `Chart`, `Files`). No state is retained
//! between calls.

use std::collections::BTreeMap;

use minijinja::{Value, context};
use tokio_util::sync::CancellationToken;

use cpack_core::{Chart, RenderContext};

use crate::error::{EngineError, Result, TemplateError};
use crate::files_object::FilesObject;
use crate::functions::{RenderFns, build_environment};

/// The template engine
#[derive(Debug, Default)]
pub struct Engine;

impl Engine {
    pub fn new() -> Self {
        Self
    }

    /// Render compose fragment templates to concrete documents.
    pub fn render_compose(
        &self,
        chart: &Chart,
        rc: &RenderContext,
        cancel: &CancellationToken,
    ) -> Result<BTreeMap<String, Vec<u8>>> {
        self.render_scope(&chart.compose_templates, &chart.helper_templates, rc, cancel)
    }

    /// Render file templates, then overlay chart static files verbatim.
    ///
    /// Rendered and static outputs share one namespace; on a name collision
    /// the static file wins (applied after templates).
    pub fn render_files(
        &self,
        chart: &Chart,
        rc: &RenderContext,
        cancel: &CancellationToken,
    ) -> Result<BTreeMap<String, Vec<u8>>> {
        let mut rendered =
            self.render_scope(&chart.file_templates, &chart.helper_templates, rc, cancel)?;

        for (name, data) in &chart.static_files {
            rendered.insert(name.clone(), data.clone());
        }

        Ok(rendered)
    }

    fn render_scope(
        &self,
        templates: &BTreeMap<String, String>,
        helpers: &BTreeMap<String, String>,
        rc: &RenderContext,
        cancel: &CancellationToken,
    ) -> Result<BTreeMap<String, Vec<u8>>> {
        if templates.is_empty() {
            return Ok(BTreeMap::new());
        }

        let fns = RenderFns::new(rc.env.clone());
        let mut env = build_environment(&fns);

        // Helpers first, so scope templates can `include` them.
        for (name, body) in helpers {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            env.add_template_owned(name.clone(), body.clone())
                .map_err(|e| TemplateError::from_minijinja(e, name, body))?;
        }

        for (name, body) in templates {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            env.add_template_owned(name.clone(), body.clone())
                .map_err(|e| TemplateError::from_minijinja(e, name, body))?;
        }

        let ctx = context! {
            Values => rc.values.inner(),
            Env => &rc.env,
            Release => &rc.release,
            Chart => &rc.chart,
            Files => Value::from_object(FilesObject::new(rc.files.clone())),
        };

        let mut results = BTreeMap::new();
        for (name, body) in templates {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }

            let template = env
                .get_template(name)
                .map_err(|e| TemplateError::from_minijinja(e, name, body))?;
            let rendered = template
                .render(&ctx)
                .map_err(|e| TemplateError::from_minijinja(e, name, body))?;

            results.insert(name.clone(), rendered.into_bytes());
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpack_core::{ChartMetadata, ReleaseInfo, StaticFiles, Values, merge_layers};
    use std::path::PathBuf;

    fn test_chart() -> Chart {
        Chart {
            base_dir: PathBuf::from("/chart"),
            metadata: ChartMetadata {
                name: "demo".to_string(),
                version: "0.1.0".to_string(),
                description: None,
            },
            values: Values::new(),
            values_schema: None,
            compose_templates: BTreeMap::new(),
            file_templates: BTreeMap::new(),
            helper_templates: BTreeMap::new(),
            static_files: BTreeMap::new(),
        }
    }

    fn test_context(values: Values) -> RenderContext {
        RenderContext::new(
            values,
            BTreeMap::new(),
            ReleaseInfo::new("myapp"),
            ChartMetadata {
                name: "demo".to_string(),
                version: "0.1.0".to_string(),
                description: None,
            },
            StaticFiles::default(),
        )
    }

    #[test]
    fn test_render_compose_with_merged_overlay() {
        let mut chart = test_chart();
        chart.compose_templates.insert(
            "web.yaml".to_string(),
            "image: \"{{ Values.app.image }}:{{ Values.app.tag }}\"".to_string(),
        );

        let base = Values::from_yaml("app:\n  image: nginx\n  tag: \"1.25\"\n").unwrap();
        let overlay = Values::from_yaml("app:\n  tag: latest\n").unwrap();
        let merged = merge_layers(Some(&base), &[overlay]);
        assert_eq!(merged.get("app.tag").unwrap(), "latest");

        let out = Engine::new()
            .render_compose(&chart, &test_context(merged), &CancellationToken::new())
            .unwrap();

        assert_eq!(
            String::from_utf8(out["web.yaml"].clone()).unwrap(),
            "image: \"nginx:latest\""
        );
    }

    #[test]
    fn test_file_template_default_for_missing_value() {
        let mut chart = test_chart();
        // Loader strips ".tpl", so the scope key is already the output name.
        chart.file_templates.insert(
            "config.yml".to_string(),
            "env: {{ Values.app.env.EXAMPLE | default(\"true\") }}".to_string(),
        );

        let values = Values::from_yaml("app:\n  image: nginx\n").unwrap();
        let out = Engine::new()
            .render_files(&chart, &test_context(values), &CancellationToken::new())
            .unwrap();

        assert_eq!(
            String::from_utf8(out["config.yml"].clone()).unwrap(),
            "env: true"
        );
    }

    #[test]
    fn test_include_reaches_helpers() {
        let mut chart = test_chart();
        chart.helper_templates.insert(
            "_fullname.tpl".to_string(),
            "{{ prefix }}-{{ name }}".to_string(),
        );
        chart.compose_templates.insert(
            "web.yaml".to_string(),
            "name: {{ include(\"_fullname.tpl\", dict(\"prefix\", Chart.name, \"name\", Release.name)) }}"
                .to_string(),
        );

        let out = Engine::new()
            .render_compose(&chart, &test_context(Values::new()), &CancellationToken::new())
            .unwrap();

        assert_eq!(
            String::from_utf8(out["web.yaml"].clone()).unwrap(),
            "name: demo-myapp"
        );
    }

    #[test]
    fn test_tpl_cannot_reach_helper_library() {
        let mut chart = test_chart();
        chart
            .helper_templates
            .insert("_h.tpl".to_string(), "helper".to_string());
        chart.compose_templates.insert(
            "web.yaml".to_string(),
            "{{ tpl(\"{{ include('_h.tpl', dict()) }}\", dict()) }}".to_string(),
        );

        let result = Engine::new().render_compose(
            &chart,
            &test_context(Values::new()),
            &CancellationToken::new(),
        );

        match result {
            Err(EngineError::Template(err)) => assert_eq!(err.template, "web.yaml"),
            other => panic!("expected template error, got {other:?}"),
        }
    }

    #[test]
    fn test_static_file_wins_name_collision() {
        let mut chart = test_chart();
        chart
            .file_templates
            .insert("a.txt".to_string(), "templated".to_string());
        chart
            .static_files
            .insert("a.txt".to_string(), b"static".to_vec());
        chart
            .static_files
            .insert("b.txt".to_string(), b"other".to_vec());

        let out = Engine::new()
            .render_files(&chart, &test_context(Values::new()), &CancellationToken::new())
            .unwrap();

        assert_eq!(out["a.txt"], b"static");
        assert_eq!(out["b.txt"], b"other");
    }

    #[test]
    fn test_static_files_copied_even_without_templates() {
        let mut chart = test_chart();
        chart
            .static_files
            .insert("only.txt".to_string(), b"bytes".to_vec());

        let out = Engine::new()
            .render_files(&chart, &test_context(Values::new()), &CancellationToken::new())
            .unwrap();

        assert_eq!(out["only.txt"], b"bytes");
    }

    #[test]
    fn test_parse_error_names_template() {
        let mut chart = test_chart();
        chart
            .compose_templates
            .insert("broken.yaml".to_string(), "{% if %}".to_string());

        let err = Engine::new()
            .render_compose(&chart, &test_context(Values::new()), &CancellationToken::new())
            .unwrap_err();

        match err {
            EngineError::Template(e) => assert_eq!(e.template, "broken.yaml"),
            other => panic!("expected template error, got {other:?}"),
        }
    }

    #[test]
    fn test_execution_error_names_template() {
        let mut chart = test_chart();
        chart
            .compose_templates
            .insert("failing.yaml".to_string(), "{{ fail(\"boom\") }}".to_string());

        let err = Engine::new()
            .render_compose(&chart, &test_context(Values::new()), &CancellationToken::new())
            .unwrap_err();

        match err {
            EngineError::Template(e) => {
                assert_eq!(e.template, "failing.yaml");
                assert!(e.message.contains("boom"));
            }
            other => panic!("expected template error, got {other:?}"),
        }
    }

    #[test]
    fn test_env_override_precedence_in_templates() {
        let mut chart = test_chart();
        chart
            .compose_templates
            .insert("env.yaml".to_string(), "home: {{ env(\"HOME\") }}".to_string());

        let mut rc = test_context(Values::new());
        rc.env.insert("HOME".to_string(), "/override".to_string());

        let out = Engine::new()
            .render_compose(&chart, &rc, &CancellationToken::new())
            .unwrap();

        assert_eq!(
            String::from_utf8(out["env.yaml"].clone()).unwrap(),
            "home: /override"
        );
    }

    #[test]
    fn test_files_object_in_render() {
        let mut chart = test_chart();
        chart.compose_templates.insert(
            "web.yaml".to_string(),
            "motd: {{ Files.get(\"motd.txt\") }} ({{ Files.exists(\"motd.txt\") }})".to_string(),
        );

        let mut statics = BTreeMap::new();
        statics.insert("motd.txt".to_string(), b"hi".to_vec());
        let mut rc = test_context(Values::new());
        rc.files = StaticFiles::new(statics);

        let out = Engine::new()
            .render_compose(&chart, &rc, &CancellationToken::new())
            .unwrap();

        assert_eq!(
            String::from_utf8(out["web.yaml"].clone()).unwrap(),
            "motd: hi (true)"
        );
    }

    #[test]
    fn test_render_cancelled() {
        let mut chart = test_chart();
        chart
            .compose_templates
            .insert("web.yaml".to_string(), "x: 1".to_string());

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = Engine::new()
            .render_compose(&chart, &test_context(Values::new()), &cancel)
            .unwrap_err();
        assert!(matches!(err, EngineError::Cancelled));
    }

    #[test]
    fn test_renders_are_independent() {
        let mut chart = test_chart();
        chart
            .compose_templates
            .insert("web.yaml".to_string(), "release: {{ Release.name }}".to_string());

        let engine = Engine::new();
        let a = engine
            .render_compose(&chart, &test_context(Values::new()), &CancellationToken::new())
            .unwrap();
        let b = engine
            .render_compose(&chart, &test_context(Values::new()), &CancellationToken::new())
            .unwrap();
        assert_eq!(a, b);
    }
}
