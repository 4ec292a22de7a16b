//! QuickJS-backed script host.
//!
//! Each run gets a fresh runtime with a memory limit and an interrupt deadline.
//! The script's capabilities are plain JavaScript functions that record what
//! the script asked for; the host applies those records once the script
//! finishes. The user's code runs through an indirect `eval` inside a
//! `try`/`catch`, so syntax errors and thrown values are both reported as the
//! run's error.
//!
//! `executed`, `request` and `response` carry the camelCase wire fields
//! (`response.body`, `response.statusCode`) plus capitalized aliases
//! (`response.Body`, `response.Headers`, `request.URL`). Response header names
//! are canonical, as in `response.headers['Content-Type']`.

use super::{ScriptBindings, ScriptHost, ScriptOutcome, ScriptReport};
use crate::models::PostProcessSource;
use rquickjs::{Context, Runtime};
use std::time::{Duration, Instant};

/// Default wall-clock budget for one script run.
pub const DEFAULT_SCRIPT_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Default heap limit for one script run.
pub const DEFAULT_MEMORY_LIMIT: usize = 16 * 1024 * 1024;

const PRELUDE: &str = r#"
var __output = "";
var __variables = [];
var __requests = [];

// Operands are separated by a space only when neither side is a string.
function __join(args) {
  var out = "";
  for (var i = 0; i < args.length; i++) {
    var a = args[i];
    if (i > 0 && typeof a !== "string" && typeof args[i - 1] !== "string") out += " ";
    out += typeof a === "object" && a !== null ? JSON.stringify(a) : String(a);
  }
  return out;
}

function print() { __output += __join(arguments); }
function println() { __output += __join(arguments) + "\n"; }

function addVariable(name, value) {
  if (name === undefined || name === null || String(name) === "") {
    throw new Error("addVariable requires a variable name");
  }
  __variables.push([String(name), value === undefined || value === null ? "" : String(value)]);
}

function __toList(v) {
  if (v === undefined || v === null) return [];
  if (Array.isArray(v)) return v.map(String);
  return [String(v)];
}

function __toMultiMap(m) {
  var out = {};
  if (m !== null && typeof m === "object") {
    Object.keys(m).forEach(function (k) { out[k] = __toList(m[k]); });
  }
  return out;
}

function addRequest(value) {
  if (typeof value === "string") {
    if (value.charAt(0) === "@") {
      var name = value.substring(1);
      if (__namedRequests.indexOf(name) < 0) {
        throw new Error("Request with name " + name + " not found");
      }
      __requests.push({ kind: "named", name: name });
    } else {
      __requests.push({ kind: "url", url: value });
    }
    return;
  }
  if (value !== null && typeof value === "object" && !Array.isArray(value)) {
    var req = {};
    Object.keys(value).forEach(function (k) {
      var lower = k.toLowerCase();
      var v = value[k];
      if (lower === "headers" || lower === "values") {
        req[k] = __toMultiMap(v);
      } else if (lower === "cookies") {
        req[k] = Array.isArray(v) ? v : [];
      } else if (lower === "allowinsecure") {
        req[k] = !!v;
      } else {
        req[k] = v === undefined || v === null ? "" : String(v);
      }
    });
    __requests.push({ kind: "object", request: req });
    return;
  }
  throw new TypeError("addRequest expects a URL, an @name reference or a request object");
}

// Capitalized aliases: response.Body, response.StatusCode, request.URL.
// They are not enumerable, so addRequest(request) and JSON.stringify skip them.
function __withAliases(o) {
  if (o === null || typeof o !== "object") return;
  Object.keys(o).forEach(function (k) {
    var alias = k === "url" ? "URL" : k.charAt(0).toUpperCase() + k.substring(1);
    if (!(alias in o)) Object.defineProperty(o, alias, { value: o[k], enumerable: false });
  });
}

executed.forEach(function (e) {
  __withAliases(e);
  __withAliases(e.request);
  __withAliases(e.response);
});
__withAliases(request);
__withAliases(response);
"#;

const DRIVER: &str = r#"
var __error = null;
try {
  (0, eval)(__source);
} catch (e) {
  __error = String(e);
}
JSON.stringify({ output: __output, variables: __variables, requests: __requests, error: __error });
"#;

/// Runs post-process scripts in an embedded QuickJS engine.
#[derive(Debug, Clone)]
pub struct QuickJsScriptHost {
    timeout: Duration,
    memory_limit: usize,
}

impl QuickJsScriptHost {
    /// Creates a host with the given per-run time and memory budget.
    pub fn new(timeout: Duration, memory_limit: usize) -> Self {
        Self {
            timeout,
            memory_limit,
        }
    }

    fn evaluate(&self, code: &str) -> Result<String, String> {
        let runtime =
            Runtime::new().map_err(|e| format!("failed to create script runtime: {}", e))?;
        runtime.set_memory_limit(self.memory_limit);

        let deadline = Instant::now() + self.timeout;
        runtime.set_interrupt_handler(Some(Box::new(move || Instant::now() > deadline)));

        let context =
            Context::full(&runtime).map_err(|e| format!("failed to create script context: {}", e))?;

        context.with(|ctx| {
            ctx.eval::<String, _>(code).map_err(|e| {
                if Instant::now() > deadline {
                    format!("script timed out after {} ms", self.timeout.as_millis())
                } else {
                    format!("script engine error: {}", e)
                }
            })
        })
    }
}

impl Default for QuickJsScriptHost {
    fn default() -> Self {
        Self::new(DEFAULT_SCRIPT_TIMEOUT, DEFAULT_MEMORY_LIMIT)
    }
}

impl ScriptHost for QuickJsScriptHost {
    fn run(&self, source: &PostProcessSource, bindings: &ScriptBindings) -> ScriptOutcome {
        if source.is_empty() {
            return ScriptOutcome::default();
        }

        let code = match build_program(source, bindings) {
            Ok(code) => code,
            Err(e) => {
                return ScriptOutcome {
                    error: Some(e),
                    ..ScriptOutcome::default()
                }
            }
        };

        let report = self.evaluate(&code).and_then(|json| {
            serde_json::from_str::<ScriptReport>(&json)
                .map_err(|e| format!("unexpected script result: {}", e))
        });

        match report {
            Ok(report) => report.into_outcome(bindings),
            Err(error) => ScriptOutcome {
                error: Some(error),
                ..ScriptOutcome::default()
            },
        }
    }
}

/// Serializes a value into a JavaScript expression that parses it back.
fn js_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, String> {
    let json = serde_json::to_string(value).map_err(|e| e.to_string())?;
    let literal = serde_json::to_string(&json).map_err(|e| e.to_string())?;
    Ok(format!("JSON.parse({})", literal))
}

fn build_program(source: &PostProcessSource, bindings: &ScriptBindings) -> Result<String, String> {
    let current = bindings.current();
    let named: Vec<&String> = bindings.profile.named_requests.keys().collect();
    let source_literal = serde_json::to_string(&source.source_code).map_err(|e| e.to_string())?;

    let mut program = String::new();
    program.push_str(&format!("var executed = {};\n", js_json(&bindings.executed)?));
    program.push_str(&format!(
        "var request = {};\n",
        js_json(&current.map(|e| &e.request))?
    ));
    program.push_str(&format!(
        "var response = {};\n",
        js_json(&current.map(|e| &e.response))?
    ));
    program.push_str(&format!("var __namedRequests = {};\n", js_json(&named)?));
    program.push_str(&format!("var __source = {};\n", source_literal));
    program.push_str(PRELUDE);
    program.push_str(DRIVER);
    Ok(program)
}
