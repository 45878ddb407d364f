// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 邮件内容合成
//!
//! 替换合并标签、改写链接为点击追踪地址、注入打开像素并保证退订链接存在。

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use url::Url;

static MERGE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("valid merge tag regex"));
static UNSUBSCRIBE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*unsubscribe_url\s*\}\}").expect("valid unsubscribe regex"));
static HREF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid href regex")
});
static BODY_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</body\s*>").expect("valid body regex"));

/// 合并标签的取值
#[derive(Debug, Clone, Default)]
pub struct MergeContext {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: String,
}

impl MergeContext {
    fn value(&self, tag: &str, unsubscribe_url: &str) -> String {
        match tag {
            "first_name" => self.first_name.clone(),
            "last_name" => self.last_name.clone(),
            "email" => self.email.clone(),
            "company" => self.company.clone(),
            "unsubscribe_url" => unsubscribe_url.to_string(),
            _ => String::new(),
        }
    }
}

/// 追踪地址生成器
pub trait LinkTracker {
    /// 点击追踪地址，返回 `None` 时保留原链接
    fn click_url(&self, target: &str) -> Option<String>;
    /// 打开追踪像素地址
    fn open_url(&self) -> Option<String>;
    fn unsubscribe_url(&self) -> String;
}

/// 合成结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedEmail {
    pub subject: String,
    pub html: String,
}

/// 替换合并标签，`escape` 为 true 时对取值做 HTML 转义
pub fn render_merge_tags(template: &str, ctx: &MergeContext, unsubscribe_url: &str, escape: bool) -> String {
    MERGE_TAG
        .replace_all(template, |caps: &Captures| {
            let value = ctx.value(&caps[1], unsubscribe_url);
            if escape {
                html_escape::encode_quoted_attribute(&value).into_owned()
            } else {
                value
            }
        })
        .into_owned()
}

/// 只追踪带主机名的绝对 http(s) 链接，退订链接保持原样
fn is_trackable(url: &str, unsubscribe_url: &str) -> bool {
    let url = url.trim();
    if url == unsubscribe_url {
        return false;
    }
    Url::parse(url)
        .map(|parsed| matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some())
        .unwrap_or(false)
}

/// 将 http(s) 链接改写为点击追踪地址
///
/// `mailto:`、`tel:`、锚点以及退订链接保持不变。
pub fn rewrite_links(html: &str, tracker: &dyn LinkTracker) -> String {
    let unsubscribe_url = tracker.unsubscribe_url();
    HREF.replace_all(html, |caps: &Captures| {
        let raw = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or_default();
        let target = html_escape::decode_html_entities(raw).into_owned();
        if !is_trackable(&target, &unsubscribe_url) {
            return caps[0].to_string();
        }
        match tracker.click_url(target.trim()) {
            Some(tracked) => format!(
                "href=\"{}\"",
                html_escape::encode_double_quoted_attribute(&tracked)
            ),
            None => caps[0].to_string(),
        }
    })
    .into_owned()
}

/// 在 `</body>` 前插入内容，没有 body 标签时追加到末尾
pub fn insert_before_body_close(html: &str, snippet: &str) -> String {
    match BODY_CLOSE.find_iter(html).last() {
        Some(m) => format!("{}{}{}", &html[..m.start()], snippet, &html[m.start()..]),
        None => format!("{}{}", html, snippet),
    }
}

pub fn open_pixel(url: &str) -> String {
    format!(
        "<img src=\"{}\" width=\"1\" height=\"1\" alt=\"\" style=\"display:none\" />",
        html_escape::encode_double_quoted_attribute(url)
    )
}

const UNSUBSCRIBE_FOOTER: &str = "<p style=\"font-size:12px;color:#888888\">\
Don't want these emails? <a href=\"{{unsubscribe_url}}\">Unsubscribe</a></p>";

/// 合成一封营销邮件
pub fn compose(
    subject: &str,
    html_body: &str,
    ctx: &MergeContext,
    tracker: &dyn LinkTracker,
) -> ComposedEmail {
    let unsubscribe_url = tracker.unsubscribe_url();

    let template = if UNSUBSCRIBE_TAG.is_match(html_body) {
        html_body.to_string()
    } else {
        insert_before_body_close(html_body, UNSUBSCRIBE_FOOTER)
    };

    let rendered = render_merge_tags(&template, ctx, &unsubscribe_url, true);
    let mut html = rewrite_links(&rendered, tracker);
    if let Some(pixel_url) = tracker.open_url() {
        html = insert_before_body_close(&html, &open_pixel(&pixel_url));
    }

    ComposedEmail {
        subject: render_merge_tags(subject, ctx, &unsubscribe_url, false),
        html,
    }
}

#[cfg(test)]
#[path = "email_composer_test.rs"]
mod tests;
