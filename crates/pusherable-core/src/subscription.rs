//! Browser-side subscription snippets.
//!
//! The page is expected to define `pusherable_notify(event, data)`.

use crate::channel::channel_name;
use crate::config::PusherSettings;
use crate::error::{ErrorCode, PusherableError, PusherableResult};
use crate::model::Model;

/// Pusher JavaScript library loaded by [`script_tag`].
pub const PUSHER_JS_URL: &str = "//js.pusher.com/3.0/pusher.min.js";

/// Event prefix reserved by the Pusher transport.
pub const RESERVED_EVENT_PREFIX: &str = "pusher:";

/// `<script>` tag that loads the Pusher library.
pub fn script_tag() -> String {
    format!(
        "<script src=\"{}\" type=\"text/javascript\"></script>",
        PUSHER_JS_URL
    )
}

/// Inline script subscribing to `instance`'s channel.
///
/// Every event except the transport's own is forwarded to
/// `pusherable_notify`.
pub fn subscribe_script<M: Model + ?Sized>(
    settings: &PusherSettings,
    instance: &M,
) -> PusherableResult<String> {
    let key = settings
        .key
        .as_deref()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            PusherableError::configuration(
                ErrorCode::ConfMissingCredentials,
                "PUSHER_KEY is required to render a subscription script",
            )
        })?;

    let options = match &settings.cluster {
        Some(cluster) => format!(", {{cluster: '{}'}}", js_escape(cluster)),
        None => String::new(),
    };

    Ok(format!(
        r#"
<script>
    var pusher = new Pusher('{key}'{options}),
        channel = pusher.subscribe('{channel}');
    channel.bind_all(function(event, data) {{
        if (event.indexOf('{prefix}') === 0) {{
            return false;
        }}
        pusherable_notify(event, data);
    }});
</script>
"#,
        key = js_escape(key),
        options = options,
        channel = js_escape(&channel_name(instance)),
        prefix = RESERVED_EVENT_PREFIX,
    ))
}

/// Escape for a single-quoted JavaScript string inside an HTML script block.
fn js_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '<' => out.push_str("\\x3C"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Task {
        id: u64,
    }

    impl Model for Task {
        fn type_name(&self) -> &str {
            "Task"
        }
        fn pk(&self) -> String {
            self.id.to_string()
        }
    }

    fn settings() -> PusherSettings {
        PusherSettings::default().with_credentials("42", "app-key", "secret")
    }

    #[test]
    fn test_script_tag() {
        assert_eq!(
            script_tag(),
            "<script src=\"//js.pusher.com/3.0/pusher.min.js\" type=\"text/javascript\"></script>"
        );
    }

    #[test]
    fn test_subscribe_script_uses_channel_name() {
        let task = Task { id: 7 };
        let script = subscribe_script(&settings(), &task).unwrap();

        assert!(script.contains("new Pusher('app-key'),"));
        assert!(script.contains(&format!(
            "pusher.subscribe('{}')",
            crate::channel::channel_name(&task)
        )));
        assert!(script.contains("pusher.subscribe('task_7')"));
        assert!(script.contains("event.indexOf('pusher:') === 0"));
        assert!(script.contains("pusherable_notify(event, data);"));
    }

    #[test]
    fn test_subscribe_script_with_cluster() {
        let script = subscribe_script(&settings().with_cluster("eu"), &Task { id: 1 }).unwrap();
        assert!(script.contains("new Pusher('app-key', {cluster: 'eu'})"));
    }

    #[test]
    fn test_subscribe_script_requires_key() {
        let err = subscribe_script(&PusherSettings::default(), &Task { id: 1 }).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_js_escape() {
        assert_eq!(js_escape("a'b"), "a\\'b");
        assert_eq!(js_escape("</script>"), "\\x3C/script>");
        assert_eq!(js_escape("back\\slash"), "back\\\\slash");
    }
}
