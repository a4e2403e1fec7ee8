//! 通知内容渲染
//!
//! 管理员公告的标题/正文直接来自通知 payload 中对应语言的条目，
//! 其余通知类型由 (类型, 语言) 的内置模板渲染，支持 `{{variable}}` 变量替换。
//! 类型到模板、类型到跳转目标都是穷尽匹配，新增类型漏配是编译错误。

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc};
use regex::Regex;
use tracing::warn;

use crate::error::{NotifyError, Result};
use crate::models::{EntityRef, Language, Notification, NotificationKind};

/// 客户端通知列表使用的默认图标
pub const ICON_PATH: &str = "/images/logo_icon.png";

/// 渲染结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub title: String,
    pub message: String,
}

/// 按类型与语言取内置模板
///
/// from_admin 没有模板（内容来自 payload），调用方不会走到这里。
fn builtin_template(kind: NotificationKind, lang: Language) -> (&'static str, &'static str) {
    match (kind, lang) {
        (NotificationKind::FromAdmin, _) => ("", ""),
        (NotificationKind::NewJoinRequest, Language::Ar) => (
            "طلب انضمام جديد",
            "قدّم {{user_name}} طلب انضمام جديد إلى المنصة",
        ),
        (NotificationKind::NewJoinRequest, Language::En) => (
            "New join request",
            "{{user_name}} submitted a new join request",
        ),
        (NotificationKind::JoinRequestApproved, Language::Ar) => (
            "تم قبول طلبك",
            "تم قبول طلب انضمامك، أهلاً بك في المنصة",
        ),
        (NotificationKind::JoinRequestApproved, Language::En) => (
            "Request approved",
            "Your join request has been approved, welcome aboard",
        ),
        (NotificationKind::JoinRequestRejected, Language::Ar) => (
            "تم رفض طلبك",
            "نعتذر، لم يتم قبول طلب انضمامك",
        ),
        (NotificationKind::JoinRequestRejected, Language::En) => (
            "Request rejected",
            "Unfortunately your join request was not accepted",
        ),
    }
}

/// 通知跳转目标
///
/// 客户端据此决定点按通知后打开哪个页面。
pub fn destination(notification: &Notification) -> Option<EntityRef> {
    match notification.kind {
        // 公告可选携带要打开的实体（如某首诗）
        NotificationKind::FromAdmin => notification.target,
        NotificationKind::NewJoinRequest
        | NotificationKind::JoinRequestApproved
        | NotificationKind::JoinRequestRejected => notification.target,
    }
}

/// 模板引擎
pub struct TemplateEngine {
    variable_regex: Regex,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine {
    pub fn new() -> Self {
        Self {
            // 匹配 {{variable_name}} 格式，变量名支持字母、数字、下划线
            variable_regex: Regex::new(r"\{\{(\w+)\}\}").unwrap(),
        }
    }

    /// 渲染通知为指定语言的标题与正文
    pub fn render(&self, notification: &Notification, lang: Language) -> Result<RenderedMessage> {
        match notification.kind {
            NotificationKind::FromAdmin => self.render_admin_payload(notification, lang),
            kind => {
                let (title, body) = builtin_template(kind, lang);
                let params = payload_params(&notification.payload);
                Ok(RenderedMessage {
                    title: self.interpolate(title, &params),
                    message: self.interpolate(body, &params),
                })
            }
        }
    }

    /// 管理员公告：从 payload 取对应语言的条目，缺失时回退默认语言
    fn render_admin_payload(
        &self,
        notification: &Notification,
        lang: Language,
    ) -> Result<RenderedMessage> {
        let pick = |field: &str| -> Result<String> {
            let by_lang = &notification.payload[field];
            by_lang[lang.as_str()]
                .as_str()
                .or_else(|| by_lang[Language::default().as_str()].as_str())
                .map(|s| s.to_string())
                .ok_or_else(|| {
                    NotifyError::Internal(format!(
                        "公告通知 {} 缺少 {field} 内容",
                        notification.id
                    ))
                })
        };

        Ok(RenderedMessage {
            title: pick("title")?,
            message: pick("body")?,
        })
    }

    /// 将模板中的 `{{variable}}` 替换为参数值
    ///
    /// 未找到的变量保留原样并记录警告日志。
    fn interpolate(&self, template: &str, params: &HashMap<String, String>) -> String {
        self.variable_regex
            .replace_all(template, |caps: &regex::Captures| {
                let var_name = &caps[1];
                match params.get(var_name) {
                    Some(value) => value.clone(),
                    None => {
                        warn!(variable = var_name, "模板变量未找到，保留原样");
                        caps[0].to_string()
                    }
                }
            })
            .into_owned()
    }
}

/// 从 payload 顶层提取字符串参数作为模板变量
fn payload_params(payload: &serde_json::Value) -> HashMap<String, String> {
    let mut params = HashMap::new();
    if let Some(object) = payload.as_object() {
        for (key, value) in object {
            match value {
                serde_json::Value::String(s) => {
                    params.insert(key.clone(), s.clone());
                }
                serde_json::Value::Number(n) => {
                    params.insert(key.clone(), n.to_string());
                }
                _ => {}
            }
        }
    }
    params
}

const MONTHS_EN: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const MONTHS_AR: [&str; 12] = [
    "يناير",
    "فبراير",
    "مارس",
    "أبريل",
    "مايو",
    "يونيو",
    "يوليو",
    "أغسطس",
    "سبتمبر",
    "أكتوبر",
    "نوفمبر",
    "ديسمبر",
];

/// 按语言格式化通知时间
///
/// 三天以内显示相对时长（分钟/小时/天），当年显示"日 月"，
/// 更早显示"日 月 年"。
pub fn format_age(created_at: DateTime<Utc>, now: DateTime<Utc>, lang: Language) -> String {
    let elapsed = now - created_at;

    if (0..=3).contains(&elapsed.num_days()) {
        return relative_age(elapsed, lang);
    }

    let month = match lang {
        Language::Ar => MONTHS_AR[created_at.month0() as usize],
        Language::En => MONTHS_EN[created_at.month0() as usize],
    };

    if created_at.year() == now.year() {
        format!("{} {}", created_at.day(), month)
    } else {
        format!("{} {} {}", created_at.day(), month, created_at.year())
    }
}

/// 相对时长，取最大的非零单位
fn relative_age(elapsed: chrono::Duration, lang: Language) -> String {
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    match lang {
        Language::En => {
            if minutes < 1 {
                "Just now".to_string()
            } else if hours < 1 {
                english_ago(minutes, "minute")
            } else if days < 1 {
                english_ago(hours, "hour")
            } else {
                english_ago(days, "day")
            }
        }
        Language::Ar => {
            if minutes < 1 {
                "الآن".to_string()
            } else if hours < 1 {
                arabic_ago(minutes, "دقيقة", "دقيقتين", "دقائق")
            } else if days < 1 {
                arabic_ago(hours, "ساعة", "ساعتين", "ساعات")
            } else {
                arabic_ago(days, "يوم", "يومين", "أيام")
            }
        }
    }
}

fn english_ago(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}

/// 阿拉伯语数词形态：单数、双数、3 到 10 用复数，11 以上回到单数
fn arabic_ago(n: i64, singular: &str, dual: &str, plural: &str) -> String {
    match n {
        1 => format!("منذ {singular}"),
        2 => format!("منذ {dual}"),
        3..=10 => format!("منذ {n} {plural}"),
        _ => format!("منذ {n} {singular}"),
    }
}
