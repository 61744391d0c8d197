//! Terminal output for the operator CLI
//!
//! Styled with `console`, framed with `cliclack` when attached to a
//! terminal, and reduced to plain prefixed lines when piped or in CI so
//! output stays greppable.

mod context;
mod output;
mod progress;
mod prompts;

pub use context::UiContext;
pub use output::{
    batch_summary, intro, key_value, key_value_status, outro_success, outro_warn, remark,
    section, step_error_detail, step_info, step_ok, step_ok_detail, step_warn, step_warn_hint,
};
pub use progress::TaskSpinner;
pub use prompts::confirm;
