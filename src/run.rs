use crate::script::{classify, ScriptClass};
use serde::Serialize;

/// A maximal stretch of characters sharing one script class.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    #[serde(rename = "class")]
    pub script: ScriptClass,
    /// Character offset of the first character.
    pub start: usize,
}

/// Split `text` into script runs. Boundaries fall exactly between a `Cjk`
/// run and an adjacent `LatinLike` run.
pub fn script_runs(text: &str) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    for (index, ch) in text.chars().enumerate() {
        let script = classify(ch);
        if let Some(run) = runs.last_mut() {
            if run.script == script {
                run.text.push(ch);
                continue;
            }
        }
        runs.push(Run {
            text: ch.to_string(),
            script,
            start: index,
        });
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_runs() {
        let cases: Vec<(&str, Vec<(&str, ScriptClass)>)> = vec![
            (
                "中文ABC 123",
                vec![
                    ("中文", ScriptClass::Cjk),
                    ("ABC", ScriptClass::LatinLike),
                    (" ", ScriptClass::Neutral),
                    ("123", ScriptClass::LatinLike),
                ],
            ),
            (
                "用𠮩A",
                vec![
                    ("用𠮩", ScriptClass::Cjk),
                    ("A", ScriptClass::LatinLike),
                ],
            ),
            ("", vec![]),
        ];

        for (input, expected) in &cases {
            let result = script_runs(input);
            let got: Vec<(&str, ScriptClass)> = result.iter().map(|r| (r.text.as_str(), r.script)).collect();
            assert_eq!(&got, expected, "runs mismatch for {:?}", input);
        }
    }

    #[test]
    fn test_run_json() {
        let json = serde_json::to_string(&script_runs("中A")).unwrap();
        assert_eq!(
            json,
            r#"[{"text":"中","class":"cjk","start":0},{"text":"A","class":"latin_like","start":1}]"#
        );
    }
}
