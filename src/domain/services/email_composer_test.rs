// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::*;

struct FakeTracker;

impl LinkTracker for FakeTracker {
    fn click_url(&self, target: &str) -> Option<String> {
        Some(format!("https://t.example/c/{}", urlencoding::encode(target)))
    }

    fn open_url(&self) -> Option<String> {
        Some("https://t.example/o/tok".to_string())
    }

    fn unsubscribe_url(&self) -> String {
        "https://t.example/unsubscribe/tok".to_string()
    }
}

fn ctx() -> MergeContext {
    MergeContext {
        first_name: "Ann <script>".into(),
        last_name: "Lee".into(),
        email: "ann@example.com".into(),
        company: "Acme & Co".into(),
    }
}

#[test]
fn test_merge_tags_are_escaped_and_unknown_tags_removed() {
    let out = render_merge_tags(
        "Hi {{first_name}} from {{ company }}{{nickname}}!",
        &ctx(),
        "u",
        true,
    );
    assert_eq!(out, "Hi Ann &lt;script&gt; from Acme &amp; Co!");
}

#[test]
fn test_subject_is_not_html_escaped() {
    let composed = compose(
        "Welcome, {{company}}",
        "<html><body>x {{unsubscribe_url}}</body></html>",
        &ctx(),
        &FakeTracker,
    );
    assert_eq!(composed.subject, "Welcome, Acme & Co");
}

#[test]
fn test_links_are_tracked_except_special_schemes() {
    let html = concat!(
        r#"<a href="https://acme.test/pricing?a=1&amp;b=2">Pricing</a>"#,
        r#"<a href='mailto:sales@acme.test'>Mail</a>"#,
        r##"<a href="#top">Top</a>"##,
        r#"<a href="tel:+15551234">Call</a>"#,
        r#"<a href="{{unsubscribe_url}}">Unsub</a>"#,
    );
    let composed = compose("s", html, &ctx(), &FakeTracker);

    assert!(composed
        .html
        .contains("https://t.example/c/https%3A%2F%2Facme.test%2Fpricing%3Fa%3D1%26b%3D2"));
    assert!(composed.html.contains("href='mailto:sales@acme.test'"));
    assert!(composed.html.contains(r##"href="#top""##));
    assert!(composed.html.contains(r#"href="tel:+15551234""#));
    assert!(composed
        .html
        .contains(r#"href="https://t.example/unsubscribe/tok""#));
    // 已有退订链接时不追加页脚
    assert_eq!(composed.html.matches("unsubscribe/tok").count(), 1);
}

#[test]
fn test_pixel_is_injected_before_body_close() {
    let composed = compose(
        "s",
        "<html><body><p>Hello</p></BODY></html>",
        &ctx(),
        &FakeTracker,
    );
    let pixel = composed.html.find("https://t.example/o/tok").unwrap();
    let close = composed.html.find("</BODY>").unwrap();
    assert!(pixel < close);
}

#[test]
fn test_unsubscribe_footer_is_appended_when_missing() {
    let composed = compose("s", "<p>No footer here</p>", &ctx(), &FakeTracker);
    assert!(composed
        .html
        .contains(r#"<a href="https://t.example/unsubscribe/tok">Unsubscribe</a>"#));
    assert!(composed.html.ends_with("/>"));
}
