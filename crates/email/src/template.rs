//! Tera rendering of the confirmation email.

use std::sync::OnceLock;

use intake_core::{ConfirmationRequest, DispatchError};
use tera::{Context, Tera};

const INTEGRATION: &str = "email";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

fn templates() -> &'static Tera {
    static TEMPLATES: OnceLock<Tera> = OnceLock::new();
    TEMPLATES.get_or_init(|| {
        let mut tera = Tera::default();
        tera.add_raw_template("confirmation.html", include_str!("../templates/confirmation.html"))
            .expect("embedded confirmation template is valid");
        tera
    })
}

/// Renders subject and HTML body for one confirmation.
pub fn render_confirmation(request: &ConfirmationRequest) -> Result<RenderedEmail, DispatchError> {
    let mut context = Context::new();
    context.insert("name", &request.name);
    context.insert("submission_id", request.submission_id.as_str());
    context.insert("company", &request.company);
    context.insert("input_method", request.input_method.label());
    context.insert("column_count", &request.column_count);
    context.insert("columns", &request.columns);

    let html = templates().render("confirmation.html", &context).map_err(|error| {
        DispatchError::Render { integration: INTEGRATION, detail: error.to_string() }
    })?;

    Ok(RenderedEmail {
        subject: format!("We received your quote request ({})", request.submission_id),
        html,
    })
}
