use anyhow::Result;

use crate::ast::Item;

#[derive(Debug, thiserror::Error)]
#[error("ParseError on line {line_no}, column {column} '{line}': {msg}")]
pub struct Error {
    msg: String,
    line_no: usize,
    column: usize,
    line: String,
}

impl Error {
    pub fn line_no(&self) -> usize {
        self.line_no
    }

    pub fn column(&self) -> usize {
        self.column
    }
}

/// Parse a pipeline config file into its module directives and properties,
/// in file order.
pub fn parse(text: &str) -> Result<Vec<Item<'_>>> {
    use combine::EasyParser;
    let mut items = Vec::with_capacity(32);
    for (i, line) in text.lines().enumerate() {
        let (item, _remainder) = config::line().easy_parse(line).map_err(|e| {
            let pos = e.position.translate_position(line).min(line.len());
            // combine's errors borrow the input, so we stringify them
            // (without their raw position) before returning.
            let msg = e
                .errors
                .iter()
                .map(|err| err.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            Error {
                msg,
                line_no: i + 1,
                column: line[..pos].chars().count() + 1,
                line: line.to_owned(),
            }
        })?;
        if let Some(item) = item {
            items.push(item);
        }
    }
    Ok(items)
}

pub mod prelude {
    pub use combine::parser::char::{char, string};
    pub use combine::parser::range::recognize;
    pub use combine::*;
}

mod lex {
    use super::prelude::*;

    p! {
        inline_space() -> (), {
            skip_many(satisfy(|c: char| c == ' ' || c == '\t'))
        }
    }

    p! {
        inline_space1() -> (), {
            skip_many1(satisfy(|c: char| c == ' ' || c == '\t'))
        }
    }

    wrapper! {
        inline(parser), {
            inline_space().with(parser).skip(inline_space())
        }
    }

    p! {
        rest_of_line() -> &'a str, {
            recognize(skip_many(any()))
        }
    }

    // module types and labels: no spaces, no punctuation besides '_' and '.'
    p! {
        word() -> &'a str, {
            recognize(skip_many1(satisfy(|c: char| c.is_alphanumeric() || c == '_' || c == '.')))
        }
    }

}

mod config {
    use super::lex::{inline, inline_space, inline_space1, rest_of_line, word};
    use super::prelude::*;
    use crate::ast::Item;
    use crate::{LABEL_KEYWORD, MODULE_DIRECTIVE};

    p! {
        label() -> &'a str, {
            attempt(
                inline_space1()
                    .with(string(LABEL_KEYWORD))
                    .skip(inline_space1())
                    .with(word())
            )
        }
    }

    p! {
        module() -> Item<'a>, {
            attempt(
                string(MODULE_DIRECTIVE)
                    .skip(inline_space1())
                    .with(word())
                    .and(optional(label()))
            )
            .map(|(ty, label)| Item::module(ty, label))
        }
    }

    p! {
        comment() -> (), {
            char('#').or(char('!')).with(rest_of_line()).map(|_| ())
        }
    }

    p! {
        key() -> &'a str, {
            recognize(skip_many1(satisfy(|c: char| !c.is_whitespace() && c != '=' && c != ':')))
        }
    }

    p! {
        property() -> Item<'a>, {
            key()
                .skip(inline(char('=').or(char(':'))))
                .and(rest_of_line())
                .map(|(key, val)| Item::property(key, str::trim_end(val)))
        }
    }

    p! {
        line() -> Option<Item<'a>>, {
            inline_space()
                .with(choice((
                    module().map(Some),
                    comment().map(|_| None::<Item<'a>>),
                    property().map(Some),
                    eof().map(|_| None::<Item<'a>>),
                )))
                .skip(inline_space())
                .skip(eof())
        }
    }

    #[cfg(test)]
    mod test {
        use super::Item;
        use anyhow::Result;
        use combine::EasyParser;
        #[test]
        fn test_module() -> Result<()> {
            assert_eq!(
                Item::module("Command", None),
                super::module().easy_parse("#Module Command").unwrap().0
            );
            assert_eq!(
                Item::module("Command", Some("trim")),
                super::module().easy_parse("#Module Command AS trim").unwrap().0
            );
            assert!(super::module().easy_parse("# just a comment").is_err());
            Ok(())
        }
        #[test]
        fn test_property() -> Result<()> {
            assert_eq!(
                Item::property("pipeline.name", "demo"),
                super::property().easy_parse("pipeline.name=demo").unwrap().0
            );
            assert_eq!(
                Item::property("input.paths", "/data/a, /data/b"),
                super::property()
                    .easy_parse("input.paths : /data/a, /data/b  ")
                    .unwrap()
                    .0
            );
            assert_eq!(
                Item::property("empty", ""),
                super::property().easy_parse("empty=").unwrap().0
            );
            Ok(())
        }
        #[test]
        fn test_line() -> Result<()> {
            assert_eq!(None, super::line().easy_parse("").unwrap().0);
            assert_eq!(None, super::line().easy_parse("   ").unwrap().0);
            assert_eq!(None, super::line().easy_parse("# comment").unwrap().0);
            assert_eq!(None, super::line().easy_parse("! also a comment").unwrap().0);
            assert_eq!(
                Some(Item::module("Stop", None)),
                super::line().easy_parse("  #Module Stop  ").unwrap().0
            );
            assert!(super::line().easy_parse("no_separator").is_err());
            Ok(())
        }
    }
}
