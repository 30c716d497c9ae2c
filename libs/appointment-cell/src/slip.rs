//! Printable HTML documents for a single appointment.

use std::fmt::Write;

use shared_utils::validation::escape_html;

use crate::models::Appointment;

pub const CLINIC_NAME: &str = "BD Healthcare";

fn or<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or(fallback)
}

fn document(title: &str, style: &str, body: &str) -> String {
    format!(
        "<html>\n<head>\n<title>{title}</title>\n<style>{style}</style>\n</head>\n<body>\n{body}\
         <script>window.onload = () => window.print();</script>\n</body>\n</html>\n"
    )
}

/// Short slip a patient brings to the visit.
pub fn appointment_slip(apt: &Appointment) -> String {
    let doctor = format!(
        "{} ({})",
        escape_html(or(apt.doctor_name.as_deref(), "N/A")),
        escape_html(or(apt.doctor_specialty.as_deref(), "General"))
    );
    let rows = [
        ("Patient", escape_html(&apt.patient_name)),
        ("Email", escape_html(&apt.patient_email)),
        ("Doctor", doctor),
        ("Date", apt.appointment_date.to_string()),
        ("Time", escape_html(apt.display_time())),
        ("Status", format!("<strong>{}</strong>", apt.status.as_str().to_uppercase())),
    ];

    let mut body = format!(
        "<div class=\"header\">\n<h1>{}</h1>\n<h3>Appointment Slip</h3>\n</div>\n<table>\n",
        CLINIC_NAME
    );
    for (label, value) in rows {
        let _ = writeln!(body, "<tr><td class=\"label\">{}</td><td>{}</td></tr>", label, value);
    }
    body.push_str("</table>\n");

    document(
        "Appointment Slip",
        "body { font-family: sans-serif; padding: 40px; line-height: 1.8; } \
         table { width: 100%; border-collapse: collapse; } td { padding: 12px; border: 1px solid #ddd; } \
         .label { font-weight: bold; width: 40%; }",
        &body,
    )
}

fn info_row(out: &mut String, label: &str, value: &str) {
    let _ = writeln!(
        out,
        "<div class=\"info-row\"><div class=\"label\">{}:</div><div class=\"value\">{}</div></div>",
        label, value
    );
}

fn text_section(out: &mut String, title: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        let _ = writeln!(
            out,
            "<div class=\"section\">\n<div class=\"section-title\">{}</div>\n<div class=\"value\">{}</div>\n</div>",
            title,
            escape_html(value)
        );
    }
}

/// Full record with the clinical sections that have content.
pub fn appointment_details(apt: &Appointment) -> String {
    let mut body = format!(
        "<div class=\"header\">\n<h1>{}</h1>\n<h2>Appointment Details</h2>\n<p>Appointment ID: #{}</p>\n</div>\n",
        CLINIC_NAME,
        apt.id.map(|id| id.to_string()).unwrap_or_default()
    );

    body.push_str("<div class=\"section\">\n<div class=\"section-title\">Patient Information</div>\n");
    info_row(&mut body, "Name", &escape_html(&apt.patient_name));
    info_row(&mut body, "Email", &escape_html(&apt.patient_email));
    info_row(&mut body, "Phone", &escape_html(&apt.patient_phone));
    info_row(&mut body, "Age", &escape_html(or(apt.patient_age.as_deref(), "N/A")));
    info_row(&mut body, "Gender", &escape_html(or(apt.patient_gender.as_deref(), "N/A")));
    body.push_str("</div>\n");

    body.push_str("<div class=\"section\">\n<div class=\"section-title\">Appointment Information</div>\n");
    info_row(&mut body, "Doctor", &escape_html(or(apt.doctor_name.as_deref(), "N/A")));
    info_row(&mut body, "Specialty", &escape_html(or(apt.doctor_specialty.as_deref(), "General")));
    info_row(&mut body, "Date", &apt.appointment_date.to_string());
    info_row(&mut body, "Time", &escape_html(apt.display_time()));
    info_row(
        &mut body,
        "Status",
        &format!(
            "<span class=\"status status-{}\">{}</span>",
            apt.status,
            apt.status.as_str().to_uppercase()
        ),
    );
    body.push_str("</div>\n");

    text_section(&mut body, "Reason for Visit", apt.reason.as_deref());
    text_section(&mut body, "Doctor's Notes / Advice", apt.notes.as_deref());
    text_section(&mut body, "Diagnosis", apt.diagnosis.as_deref());
    text_section(&mut body, "Prescription", apt.prescription.as_deref());

    document(
        "Appointment Details",
        "body { font-family: sans-serif; padding: 40px; line-height: 1.8; } \
         .section { margin-bottom: 25px; } .section-title { font-weight: bold; font-size: 18px; } \
         .info-row { display: flex; } .label { font-weight: bold; width: 200px; }",
        &body,
    )
}
