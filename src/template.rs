//! Fixed document shell the card markup is injected into.
//!
//! The shell pulls Tailwind, the Rajdhani/Poppins webfonts and Font Awesome
//! from their CDNs, so the page only renders correctly once the network has
//! settled.

const MARKUP_TOKEN: &str = "{{CARD_MARKUP}}";

const DOCUMENT_SHELL: &str = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <script src="https://cdn.tailwindcss.com"></script>
    <link href="https://fonts.googleapis.com/css2?family=Rajdhani:wght@500;600;700&family=Poppins:wght@300;400;500;600&display=swap" rel="stylesheet">
    <link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.0/css/all.min.css">
    <style>
        body {
            margin: 0; padding: 0; background: transparent;
            display: flex; justify-content: center; align-items: center;
            height: 100vh; width: 100vw; overflow: hidden;
        }
        * { -webkit-print-color-adjust: exact !important; print-color-adjust: exact !important; }
    </style>
</head>
<body>
    {{CARD_MARKUP}}
</body>
</html>
"#;

/// Wrap `fragment` in the card document shell.
///
/// The fragment is inserted verbatim: no escaping, no evaluation. Only the
/// shell is scanned for the placeholder, so markup that happens to contain
/// the placeholder text is left alone.
pub fn build_document(fragment: &str) -> String {
    let (head, tail) = DOCUMENT_SHELL
        .split_once(MARKUP_TOKEN)
        .unwrap_or((DOCUMENT_SHELL, ""));

    let mut doc = String::with_capacity(head.len() + fragment.len() + tail.len());
    doc.push_str(head);
    doc.push_str(fragment);
    doc.push_str(tail);
    doc
}
