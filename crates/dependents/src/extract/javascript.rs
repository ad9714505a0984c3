//! CommonJS and ES module specifier extraction.

use std::sync::LazyLock;

use regex::Regex;

use super::{ExtractError, Extractor, quoted, strip_comments};

/// `require('x')`, with the callee not a property access.
pub(super) static REQUIRE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|[^.\w$])require\s*\(\s*(?:'([^'\n]+)'|"([^"\n]+)"|`([^`$\n]+)`)\s*\)"#)
        .expect("require regex is valid")
});

/// `import x from 'y'`, `export { x } from 'y'`, `import type T from 'y'`.
static FROM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|[^.\w$])(?:import|export)\s[^'";]*?\bfrom\s*(?:'([^'\n]+)'|"([^"\n]+)")"#)
        .expect("import-from regex is valid")
});

/// Side-effect `import 'x'` and dynamic `import('x')`.
static BARE_IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|[^.\w$])import\s*(?:\(\s*)?(?:'([^'\n]+)'|"([^"\n]+)")"#)
        .expect("bare import regex is valid")
});

/// Extractor for `require` calls and ES `import`/`export` statements.
///
/// Both styles are collected from every JavaScript file, since transpiled
/// code routinely mixes them.
#[derive(Debug, Clone, Copy, Default)]
pub struct JavaScriptExtractor;

impl Extractor for JavaScriptExtractor {
    fn extract(&self, content: &str) -> Result<Vec<String>, ExtractError> {
        let text = strip_comments(content)?;

        let mut found: Vec<(usize, String)> = Vec::new();
        for re in [&*REQUIRE_RE, &*FROM_RE, &*BARE_IMPORT_RE] {
            found.extend(re.captures_iter(&text).filter_map(|caps| quoted(&caps)));
        }
        found.sort_by_key(|(offset, _)| *offset);

        Ok(found.into_iter().map(|(_, specifier)| specifier).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn extract(content: &str) -> Vec<String> {
        JavaScriptExtractor.extract(content).expect("should extract")
    }

    #[rstest]
    #[case::single_quotes("var a = require('./a');", &["./a"])]
    #[case::double_quotes(r#"const b = require("../b");"#, &["../b"])]
    #[case::template_literal("const c = require(`./c`);", &["./c"])]
    #[case::spaced("require ( './a' )", &["./a"])]
    #[case::default_import("import a from './a';", &["./a"])]
    #[case::named_import("import { x, y } from \"lib/x\";", &["lib/x"])]
    #[case::multiline_import("import {\n  x,\n  y,\n} from './xy';", &["./xy"])]
    #[case::namespace_import("import * as ns from './ns';", &["./ns"])]
    #[case::type_import("import type { T } from './types';", &["./types"])]
    #[case::side_effect("import './polyfill';", &["./polyfill"])]
    #[case::dynamic("const m = await import('./lazy');", &["./lazy"])]
    #[case::reexport("export * from './all';\nexport { a } from './a';", &["./all", "./a"])]
    fn extracts_specifiers(#[case] content: &str, #[case] expected: &[&str]) {
        assert_eq!(extract(content), expected);
    }

    #[test]
    fn keeps_source_order_across_styles() {
        let content = "import a from './a';\nconst b = require('./b');\nimport './c';";

        assert_eq!(extract(content), ["./a", "./b", "./c"]);
    }

    #[test]
    fn ignores_commented_imports() {
        let content = "// require('./gone')\n/* import x from './gone2'; */\nrequire('./kept');";

        assert_eq!(extract(content), ["./kept"]);
    }

    #[test]
    fn ignores_property_require_and_dynamic_expressions() {
        let content = "loader.require('./not');\nrequire(name);\nrequire(`./${name}`);";

        assert!(extract(content).is_empty());
    }

    #[test]
    fn ignores_local_exports() {
        assert!(extract("export const from = 1;\nexport default from;").is_empty());
    }

    #[test]
    fn keeps_duplicates() {
        assert_eq!(extract("require('./a'); require('./a');"), ["./a", "./a"]);
    }

    #[test]
    fn malformed_comment_is_an_error() {
        assert!(JavaScriptExtractor.extract("require('./a');\n/* oops").is_err());
    }
}
