//! MiniJinja integration for chart static files
//!
//! Exposes the chart's static files to templates as the `Files` object:
//!
//! ```jinja2
//! {# Read a file as string #}
//! {{ Files.get("config/nginx.conf") }}
//!
//! {# Read raw bytes (for b64encode) #}
//! {{ Files.get_bytes("logo.png") | b64encode }}
//!
//! {# Check if a file exists #}
//! {% if Files.exists("config/custom.yaml") %}
//!   {{ Files.get("config/custom.yaml") }}
//! {% endif %}
//! ```

use std::sync::Arc;

use cpack_core::StaticFiles;
use minijinja::value::{Object, ObjectRepr, Value};
use minijinja::{Error, ErrorKind};

/// MiniJinja Object wrapper over [`StaticFiles`]
#[derive(Debug)]
pub struct FilesObject {
    files: StaticFiles,
}

impl FilesObject {
    pub fn new(files: StaticFiles) -> Self {
        Self { files }
    }
}

impl Object for FilesObject {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Plain
    }

    fn call_method(
        self: &Arc<Self>,
        _state: &minijinja::State,
        method: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        match method {
            "get" => {
                let path = get_path_arg(args, "get")?;
                Ok(Value::from(self.files.get(&path)))
            }

            "get_bytes" => {
                let path = get_path_arg(args, "get_bytes")?;
                Ok(Value::from(self.files.get_bytes(&path).unwrap_or_default()))
            }

            "exists" => {
                let path = get_path_arg(args, "exists")?;
                Ok(Value::from(self.files.exists(&path)))
            }

            _ => Err(Error::new(
                ErrorKind::UnknownMethod,
                format!(
                    "Files object has no method '{}'. Available methods: get, get_bytes, exists",
                    method
                ),
            )),
        }
    }
}

fn get_path_arg(args: &[Value], method: &str) -> Result<String, Error> {
    let arg = args.first().ok_or_else(|| {
        Error::new(
            ErrorKind::MissingArgument,
            format!("Files.{} requires a path argument", method),
        )
    })?;

    arg.as_str().map(str::to_string).ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("Files.{} path must be a string", method),
        )
    })
}
