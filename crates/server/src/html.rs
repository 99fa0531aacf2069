use html_escape::encode_text;
use rxscan_core::{or_not_available, DrugLabel, PrescriptionForm};

const STYLE: &str = r#"<style>
body { font-family: system-ui, sans-serif; max-width: 720px; margin: 2rem auto; padding: 0 1rem; color: #222; }
h1 { font-size: 1.6rem; }
label { display: block; margin-top: 0.8rem; font-weight: 600; }
input[type=text], input[type=file] { width: 100%; padding: 0.4rem; margin-top: 0.2rem; }
button { margin-top: 1.2rem; padding: 0.5rem 1.4rem; }
dt { font-weight: 600; margin-top: 0.8rem; }
dd { margin-left: 0; white-space: pre-wrap; }
.word { font-size: 1.4rem; font-family: monospace; }
</style>"#;

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n{STYLE}\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        encode_text(title)
    )
}

pub fn index_page() -> String {
    page(
        "Prescription reader",
        r#"<h1>Prescription reader</h1>
<form method="post" action="/" enctype="multipart/form-data">
<label for="patient_name">Patient name</label>
<input type="text" id="patient_name" name="patient_name" required>
<label for="doctor_name">Doctor name</label>
<input type="text" id="doctor_name" name="doctor_name" required>
<label for="hospital_name">Hospital name</label>
<input type="text" id="hospital_name" name="hospital_name" required>
<label for="prescription_file">Prescription image</label>
<input type="file" id="prescription_file" name="prescription_file" accept="image/*" required>
<button type="submit">Read prescription</button>
</form>"#,
    )
}

const SECTION_TITLES: [&str; 6] = [
    "Purpose",
    "Keep out of reach of children",
    "Warnings",
    "Dosage and administration",
    "Pregnancy or breast-feeding",
    "Stop use",
];

pub fn result_page(form: &PrescriptionForm, interpreted_word: &str, label: &DrugLabel) -> String {
    let mut body = String::from("<h1>Prescription result</h1>\n<dl>\n");
    for (title, value) in [
        ("Patient", form.patient_name.as_str()),
        ("Doctor", form.doctor_name.as_str()),
        ("Hospital", form.hospital_name.as_str()),
    ] {
        body.push_str(&format!("<dt>{title}</dt><dd>{}</dd>\n", encode_text(value)));
    }
    body.push_str(&format!(
        "<dt>Interpreted word</dt><dd class=\"word\">{}</dd>\n</dl>\n<h2>Drug label</h2>\n<dl>\n",
        encode_text(interpreted_word)
    ));
    for (title, (_, value)) in SECTION_TITLES.iter().zip(label.sections()) {
        body.push_str(&format!(
            "<dt>{title}</dt><dd>{}</dd>\n",
            encode_text(or_not_available(value))
        ));
    }
    body.push_str("</dl>\n<p><a href=\"/\">Read another prescription</a></p>");
    page("Prescription result", &body)
}

/// Shown when the form flow fails; `heading` is fixed text, `detail` is escaped.
pub fn error_page(heading: &str, detail: &str) -> String {
    page(
        heading,
        &format!(
            "<h1>{}</h1>\n<p>{}</p>\n<p><a href=\"/\">Try again</a></p>",
            encode_text(heading),
            encode_text(detail)
        ),
    )
}
