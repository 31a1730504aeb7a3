//! Read-only gate for LLM-generated `kubectl` command lines.
//!
//! A line is accepted only if every `;`/`&&`-separated segment is a plain
//! `kubectl` invocation of an allowlisted read-only verb. Nothing here spawns a
//! process; an accepted line is returned as argv vectors for the executor.

use std::fmt;

use crate::error::GuardRejection;

/// Rejected when found anywhere in the lowercased line, including inside
/// quotes and resource names.
const DENIED_SUBSTRINGS: &[&str] = &["delete", "exec", "apply", "patch", "replace", "edit"];

/// Rejected when a whole token equals one of these.
const MUTATING_TOKENS: &[&str] = &[
    "create",
    "scale",
    "run",
    "set",
    "label",
    "annotate",
    "drain",
    "cordon",
    "uncordon",
    "taint",
    "expose",
    "autoscale",
    "cp",
    "attach",
    "port-forward",
    "proxy",
    "debug",
];

/// Flags that would let the command act with other credentials or another cluster.
const CREDENTIAL_FLAGS: &[&str] = &[
    "--kubeconfig",
    "--token",
    "--as",
    "--as-group",
    "--as-uid",
    "--username",
    "--password",
    "--server",
    "-s",
    "--client-key",
    "--client-certificate",
];

/// Flags that make kubectl write files on this host.
const FILE_WRITING_FLAGS: &[&str] = &[
    "--profile",
    "--profile-output",
    "--cache-dir",
    "--log-file",
    "--log-dir",
    "--output-directory",
];

/// The only flags accepted before the verb and its subcommand. Each takes a
/// value, either inline (`--flag=value`) or as the next token.
const LEADING_FLAGS: &[&str] = &[
    "-n",
    "--namespace",
    "--context",
    "--cluster",
    "--user",
    "-o",
    "--output",
    "--request-timeout",
];

/// `config view` flags that print client keys and tokens.
const SECRET_REVEALING_FLAGS: &[&str] = &["--raw", "--flatten"];

const ALLOWED_VERBS: &[&str] = &[
    "get",
    "describe",
    "logs",
    "top",
    "explain",
    "api-resources",
    "api-versions",
    "cluster-info",
    "version",
    "events",
    "auth",
    "config",
    "rollout",
];

/// Verbs that are only read-only for some subcommands.
fn allowed_subcommands(verb: &str) -> Option<&'static [&'static str]> {
    match verb {
        "auth" => Some(&["can-i"]),
        "config" => Some(&["view", "current-context", "get-contexts"]),
        "rollout" => Some(&["status", "history"]),
        _ => None,
    }
}

/// One accepted `kubectl` call; `args` excludes the leading `kubectl`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KubectlInvocation {
    args: Vec<String>,
    verb: String,
}

impl KubectlInvocation {
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn verb(&self) -> &str {
        &self.verb
    }
}

impl fmt::Display for KubectlInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("kubectl")?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{arg}'")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CommandGuard;

impl CommandGuard {
    pub fn check(&self, line: &str) -> Result<Vec<KubectlInvocation>, GuardRejection> {
        let line = line.trim();
        if line.is_empty() {
            return Err(GuardRejection::Empty);
        }

        let segments = split_segments(line)?;

        let mut invocations = Vec::with_capacity(segments.len());
        for tokens in segments {
            let Some((program, rest)) = tokens.split_first() else {
                continue;
            };
            if !program.eq_ignore_ascii_case("kubectl") {
                return Err(GuardRejection::NotKubectl(program.clone()));
            }
            invocations.push(rest.to_vec());
        }
        if invocations.is_empty() {
            return Err(GuardRejection::Empty);
        }

        let lowered = line.to_lowercase();
        if let Some(denied) = DENIED_SUBSTRINGS.iter().find(|d| lowered.contains(*d)) {
            return Err(GuardRejection::Denied((*denied).to_string()));
        }

        invocations
            .into_iter()
            .map(check_invocation)
            .collect()
    }
}

fn check_invocation(args: Vec<String>) -> Result<KubectlInvocation, GuardRejection> {
    let lowered: Vec<String> = args.iter().map(|a| a.to_lowercase()).collect();

    for token in &lowered {
        if MUTATING_TOKENS.contains(&token.as_str()) {
            return Err(GuardRejection::Denied(token.clone()));
        }
        let name = flag_name(token);
        if CREDENTIAL_FLAGS.contains(&name) || FILE_WRITING_FLAGS.contains(&name) {
            return Err(GuardRejection::Denied(name.to_string()));
        }
    }

    let path = command_path(&lowered)?;
    let Some(&verb) = path.first() else {
        return Err(GuardRejection::NotAllowed("kubectl".to_string()));
    };

    if !ALLOWED_VERBS.contains(&verb) {
        return Err(GuardRejection::NotAllowed(verb.to_string()));
    }

    if let Some(subcommands) = allowed_subcommands(verb) {
        let sub = path.get(1).copied().unwrap_or_default();
        if !subcommands.contains(&sub) {
            let shown = format!("{verb} {sub}");
            return Err(if verb == "rollout" && !sub.is_empty() {
                GuardRejection::Denied(shown.trim().to_string())
            } else {
                GuardRejection::NotAllowed(shown.trim().to_string())
            });
        }
        if verb == "config"
            && sub == "view"
            && let Some(flag) = lowered
                .iter()
                .map(|t| flag_name(t))
                .find(|name| SECRET_REVEALING_FLAGS.contains(name))
        {
            return Err(GuardRejection::Denied(format!("config view {flag}")));
        }
    }

    Ok(KubectlInvocation {
        verb: verb.to_string(),
        args,
    })
}

/// `--flag=value` -> `--flag`; anything else is returned unchanged.
fn flag_name(token: &str) -> &str {
    token.split_once('=').map_or(token, |(name, _)| name)
}

/// The verb and, for verbs with subcommands, the subcommand.
///
/// kubectl resolves its command from the words left after removing global
/// flags, so any flag it might read a value for could shift which word is the
/// verb. Only [`LEADING_FLAGS`] may appear before the path is complete.
fn command_path(tokens: &[String]) -> Result<Vec<&str>, GuardRejection> {
    let mut path = Vec::with_capacity(2);
    let mut tokens = tokens.iter();
    while let Some(token) = tokens.next() {
        if token.starts_with('-') {
            let name = flag_name(token);
            if !LEADING_FLAGS.contains(&name) {
                return Err(GuardRejection::NotAllowed(name.to_string()));
            }
            if name.len() == token.len() {
                tokens.next();
            }
            continue;
        }

        path.push(token.as_str());
        let wanted = if allowed_subcommands(path[0]).is_some() { 2 } else { 1 };
        if path.len() == wanted {
            break;
        }
    }
    Ok(path)
}

/// Tokenize `line` into segments separated by `;` or `&&`.
///
/// Quotes group words and are stripped. Outside quotes, pipes, redirects,
/// backgrounding, backticks and `$(`/`${` are refused; a newline is refused anywhere.
fn split_segments(line: &str) -> Result<Vec<Vec<String>>, GuardRejection> {
    let mut segments = Vec::new();
    let mut tokens: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\n' || c == '\r' {
            return Err(GuardRejection::ShellSyntax("newline".to_string()));
        }

        if let Some(q) = quote {
            if c == q {
                quote = None;
            } else {
                current.push(c);
            }
            continue;
        }

        match c {
            '\'' | '"' => {
                quote = Some(c);
                in_token = true;
            }
            '|' | '>' | '<' | '`' => return Err(GuardRejection::ShellSyntax(c.to_string())),
            '$' if matches!(chars.peek(), Some('(' | '{')) => {
                let next = chars.next().unwrap_or('(');
                return Err(GuardRejection::ShellSyntax(format!("${next}")));
            }
            '&' => {
                if chars.peek() != Some(&'&') {
                    return Err(GuardRejection::ShellSyntax("&".to_string()));
                }
                chars.next();
                flush_token(&mut tokens, &mut current, &mut in_token);
                segments.push(std::mem::take(&mut tokens));
            }
            ';' => {
                flush_token(&mut tokens, &mut current, &mut in_token);
                segments.push(std::mem::take(&mut tokens));
            }
            c if c.is_whitespace() => flush_token(&mut tokens, &mut current, &mut in_token),
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if quote.is_some() {
        return Err(GuardRejection::UnbalancedQuotes);
    }
    flush_token(&mut tokens, &mut current, &mut in_token);
    segments.push(tokens);

    Ok(segments.into_iter().filter(|s| !s.is_empty()).collect())
}

fn flush_token(tokens: &mut Vec<String>, current: &mut String, in_token: &mut bool) {
    if *in_token {
        tokens.push(std::mem::take(current));
        *in_token = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(line: &str) -> Result<Vec<KubectlInvocation>, GuardRejection> {
        CommandGuard.check(line)
    }

    fn rejected(line: &str) -> bool {
        check(line).is_err()
    }

    #[test]
    fn accepts_read_only_commands() {
        for line in [
            "kubectl get pods -n default",
            "kubectl -n kube-system get pods",
            "kubectl --namespace=monitoring describe svc prometheus",
            "kubectl logs my-pod -c app --tail 50",
            "kubectl top nodes",
            "kubectl get nodes -o jsonpath='{.items[*].metadata.name}'",
            "kubectl config current-context",
            "kubectl auth can-i list pods",
            "kubectl rollout status deployment/web",
            "kubectl cluster-info",
        ] {
            assert!(check(line).is_ok(), "{line} should be accepted: {:?}", check(line));
        }
    }

    #[test]
    fn splits_chained_commands() {
        let invocations = check("kubectl get nodes; kubectl cluster-info && kubectl version").unwrap();
        let verbs: Vec<_> = invocations.iter().map(KubectlInvocation::verb).collect();
        assert_eq!(verbs, ["get", "cluster-info", "version"]);
        assert_eq!(invocations[0].to_string(), "kubectl get nodes");
    }

    #[test]
    fn quoted_arguments_stay_whole() {
        let invocations = check(r#"kubectl get pods -l "app in (web, api)""#).unwrap();
        assert_eq!(invocations[0].args(), ["get", "pods", "-l", "app in (web, api)"]);
        assert_eq!(
            invocations[0].to_string(),
            "kubectl get pods -l 'app in (web, api)'"
        );
    }

    #[test]
    fn destructive_verbs_are_denied_in_any_case() {
        for line in [
            "kubectl delete pod web-1",
            "KUBECTL DELETE pod web-1",
            "kubectl Delete ns prod",
            "kubectl apply -f deploy.yaml",
            "kubectl edit deploy web",
            "kubectl patch deploy web -p '{}'",
            "kubectl replace -f x.yaml",
            "kubectl exec -it web -- sh",
        ] {
            assert!(
                matches!(check(line), Err(GuardRejection::Denied(_))),
                "{line} must be denied"
            );
        }
    }

    #[test]
    fn flags_before_the_verb_do_not_hide_it() {
        assert!(matches!(
            check("kubectl -n prod --context live scale deploy web --replicas 0"),
            Err(GuardRejection::Denied(v)) if v == "scale"
        ));
        assert!(matches!(
            check("kubectl --namespace prod create ns x"),
            Err(GuardRejection::Denied(v)) if v == "create"
        ));
        assert!(matches!(
            check("kubectl -n prod cordon node-1"),
            Err(GuardRejection::Denied(_))
        ));
    }

    #[test]
    fn chained_destructive_segment_rejects_the_whole_line() {
        assert!(rejected("kubectl get pods; kubectl delete pods --all"));
        assert!(rejected("kubectl get pods && kubectl drain node-1"));
        assert!(rejected("kubectl get pods; rm -rf /"));
        assert!(matches!(
            check("kubectl get pods; rm -rf /"),
            Err(GuardRejection::NotKubectl(p)) if p == "rm"
        ));
    }

    #[test]
    fn shell_metacharacters_are_refused() {
        for (line, token) in [
            ("kubectl get pods | xargs kubectl annotate", "|"),
            ("kubectl get pods > /etc/passwd", ">"),
            ("kubectl get pods < in", "<"),
            ("kubectl get pods `rm -rf /`", "`"),
            ("kubectl get pods $(whoami)", "$("),
            ("kubectl get pods ${HOME}", "${"),
            ("kubectl get pods & sleep 100", "&"),
            ("kubectl get pods\nkubectl delete pod x", "newline"),
        ] {
            assert_eq!(
                check(line),
                Err(GuardRejection::ShellSyntax(token.to_string())),
                "{line}"
            );
        }
    }

    #[test]
    fn quoting_does_not_smuggle_destructive_verbs() {
        assert!(rejected(r#"kubectl "delete" pod x"#));
        assert!(rejected("kubectl 'scale' deploy web --replicas=0"));
        assert!(rejected(r#"kubectl get pods -l "x"; kubectl "cordon" n1"#));
    }

    #[test]
    fn non_kubectl_programs_are_refused() {
        assert!(matches!(check("helm uninstall web"), Err(GuardRejection::NotKubectl(_))));
        assert!(matches!(check("sh -c 'kubectl get pods'"), Err(GuardRejection::NotKubectl(_))));
        assert_eq!(check("   "), Err(GuardRejection::Empty));
        assert_eq!(check(" ; && "), Err(GuardRejection::Empty));
    }

    #[test]
    fn unknown_or_partial_verbs_are_not_allowed() {
        assert!(matches!(check("kubectl"), Err(GuardRejection::NotAllowed(_))));
        assert!(matches!(check("kubectl -n default"), Err(GuardRejection::NotAllowed(_))));
        assert!(matches!(check("kubectl certificate approve csr-1"), Err(GuardRejection::NotAllowed(_))));
        assert!(matches!(
            check("kubectl config use-context prod"),
            Err(GuardRejection::NotAllowed(v)) if v == "config use-context"
        ));
        assert!(matches!(
            check("kubectl config set-credentials admin"),
            Err(GuardRejection::NotAllowed(_))
        ));
        assert!(matches!(check("kubectl auth reconcile"), Err(GuardRejection::NotAllowed(_))));
    }

    #[test]
    fn mutating_rollout_subcommands_are_denied() {
        for line in [
            "kubectl rollout restart deploy/web",
            "kubectl rollout undo deploy/web",
            "kubectl rollout pause deploy/web",
            "kubectl rollout resume deploy/web",
        ] {
            assert!(matches!(check(line), Err(GuardRejection::Denied(_))), "{line}");
        }
    }

    #[test]
    fn credential_overrides_are_denied() {
        for line in [
            "kubectl get pods --kubeconfig /tmp/admin.conf",
            "kubectl get pods --kubeconfig=/tmp/admin.conf",
            "kubectl get secrets --as system:admin",
            "kubectl get pods --token=abc",
            "kubectl get pods -s https://other:6443",
        ] {
            assert!(matches!(check(line), Err(GuardRejection::Denied(_))), "{line}");
        }
    }

    #[test]
    fn unknown_flags_before_the_verb_are_not_allowed() {
        for line in [
            "kubectl --cache-dir get certificate approve csr-1",
            "kubectl --tls-server-name get certificate deny csr-1",
            "kubectl --vmodule get certificate approve csr-1",
            "kubectl --certificate-authority=/tmp/ca.crt get pods",
            "kubectl -v 9 get pods",
            "kubectl rollout --tls-server-name status restart deploy/web",
        ] {
            assert!(rejected(line), "{line} must be rejected");
        }
        assert!(matches!(
            check("kubectl --tls-server-name get certificate deny csr-1"),
            Err(GuardRejection::NotAllowed(f)) if f == "--tls-server-name"
        ));
        assert!(matches!(
            check("kubectl --insecure-skip-tls-verify=true get pods"),
            Err(GuardRejection::NotAllowed(_))
        ));
    }

    #[test]
    fn allowlisted_flags_may_precede_the_verb_and_subcommand() {
        let invocations = check("kubectl --context=live --namespace prod get pods").unwrap();
        assert_eq!(invocations[0].verb(), "get");

        let invocations = check("kubectl rollout -n prod status deploy/web").unwrap();
        assert_eq!(invocations[0].verb(), "rollout");

        // Flags after the verb are not restricted by the leading allowlist.
        let invocations = check("kubectl get pods --show-labels -A").unwrap();
        assert_eq!(invocations[0].args(), ["get", "pods", "--show-labels", "-A"]);
    }

    #[test]
    fn file_writing_flags_are_denied_anywhere() {
        for (line, flag) in [
            ("kubectl get pods --profile=cpu --profile-output=/tmp/x", "--profile"),
            ("kubectl get pods --profile-output /tmp/x", "--profile-output"),
            ("kubectl --cache-dir=/tmp/c get pods", "--cache-dir"),
            ("kubectl logs web --log-file=/tmp/log", "--log-file"),
            ("kubectl get pods --log-dir /tmp", "--log-dir"),
            ("kubectl cluster-info dump --output-directory=/tmp/dump", "--output-directory"),
        ] {
            assert_eq!(
                check(line),
                Err(GuardRejection::Denied(flag.to_string())),
                "{line}"
            );
        }
    }

    #[test]
    fn config_view_cannot_reveal_credentials() {
        for line in [
            "kubectl config view --raw",
            "kubectl config view --raw=true",
            "kubectl config view --flatten",
            "kubectl config view --minify --RAW",
        ] {
            assert!(
                matches!(check(line), Err(GuardRejection::Denied(v)) if v.starts_with("config view --")),
                "{line}"
            );
        }
        assert!(check("kubectl config view --minify").is_ok());
        assert!(check("kubectl config view").is_ok());
    }

    #[test]
    fn value_flags_skip_their_argument() {
        let invocations = check("kubectl -o wide get pods").unwrap();
        assert_eq!(invocations[0].verb(), "get");

        // The namespace value must not be mistaken for the verb.
        let invocations = check("kubectl -n logs get pods").unwrap();
        assert_eq!(invocations[0].verb(), "get");
    }
}
