//! Reading and writing the line-based corpus format.
//!
//! Each line holds one tree: its tokens, then optionally the delimiter `@@@` followed by
//! constituents written as `(begin,end,[label,label])`. Lines starting with `#` are comments and
//! a line `:N` before the first tree records the cursor of an interrupted run.
use chumsky::{prelude::*, text::inline_whitespace};
use serde::Serialize;
use std::{fmt::Display, io::Write, str::FromStr, time::Duration};

use super::{Constituent, CorpusError, Interner, Sentence, Session, Tree, Treebank};

pub const DELIMITER: &str = "@@@";
const COMMENT: char = '#';
const CHECKPOINT: char = ':';

#[derive(Debug, Clone, PartialEq, Eq)]
struct RawConstituent {
    begin: usize,
    end: usize,
    labels: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RawTree<'src> {
    tokens: Vec<&'src str>,
    constituents: Vec<RawConstituent>,
    rest: &'src str,
}

fn number<'src, T>() -> impl Parser<'src, &'src str, T, extra::Err<Rich<'src, char>>>
where
    T: FromStr,
    T::Err: Display,
{
    text::int(10)
        .try_map(|digits: &str, span| digits.parse::<T>().map_err(|e| Rich::custom(span, e)))
        .padded_by(inline_whitespace())
}

fn comma<'src>() -> impl Parser<'src, &'src str, char, extra::Err<Rich<'src, char>>> {
    just(',').padded_by(inline_whitespace())
}

fn constituent_parser<'src>()
-> impl Parser<'src, &'src str, RawConstituent, extra::Err<Rich<'src, char>>> {
    let labels = number::<u64>()
        .separated_by(comma())
        .at_least(1)
        .collect::<Vec<_>>()
        .delimited_by(just('['), just(']'))
        .labelled("label list");

    just('(')
        .ignore_then(number::<usize>())
        .then_ignore(comma())
        .then(number::<usize>())
        .then_ignore(comma())
        .then(labels.padded_by(inline_whitespace()))
        .then_ignore(just(')'))
        .map(|((begin, end), labels)| RawConstituent { begin, end, labels })
        .labelled("constituent")
}

fn tree_parser<'src>() -> impl Parser<'src, &'src str, RawTree<'src>, extra::Err<Rich<'src, char>>>
{
    let token = any()
        .filter(|c: &char| !c.is_whitespace())
        .repeated()
        .at_least(1)
        .to_slice()
        .filter(|word: &&str| *word != DELIMITER)
        .labelled("token");

    // Garbage is only skipped once at least one constituent has been read.
    let constituents = just(DELIMITER).ignore_then(
        constituent_parser()
            .padded_by(inline_whitespace())
            .repeated()
            .at_least(1)
            .collect::<Vec<_>>()
            .then(any().repeated().to_slice())
            .or(inline_whitespace().to((vec![], ""))),
    );

    token
        .padded_by(inline_whitespace())
        .repeated()
        .collect::<Vec<_>>()
        .then(constituents.or_not())
        .then_ignore(end())
        .map(|(tokens, constituents)| {
            let (constituents, rest) = constituents.unwrap_or_default();
            RawTree {
                tokens,
                constituents,
                rest,
            }
        })
}

impl Treebank {
    ///Parses a corpus, interning its tokens and registering its labels with `session`.
    ///
    ///Text after the last well-formed constituent of a line is skipped with a warning.
    pub fn parse(input: &str, session: &mut Session) -> Result<Treebank, CorpusError> {
        let parser = tree_parser();
        let mut trees = vec![];
        let mut comments = vec![];
        let mut cursor = 0;

        for (line, text) in input.lines().enumerate().map(|(i, x)| (i + 1, x)) {
            let content = text.trim();
            if content.is_empty() {
                continue;
            } else if content.starts_with(COMMENT) {
                comments.push(text.to_string());
                continue;
            }
            if trees.is_empty() {
                if let Some(marker) = content.strip_prefix(CHECKPOINT) {
                    cursor = marker
                        .trim()
                        .parse()
                        .map_err(|_| CorpusError::BadCheckpoint {
                            line,
                            marker: marker.to_string(),
                        })?;
                    continue;
                }
            }

            let raw = parser
                .parse(content)
                .into_result()
                .map_err(|errs| CorpusError::Syntax {
                    line,
                    message: errs
                        .into_iter()
                        .map(|x| x.to_string())
                        .collect::<Vec<_>>()
                        .join("\n"),
                })?;
            if raw.tokens.is_empty() {
                return Err(CorpusError::MissingSentence { line });
            }
            if !raw.rest.trim().is_empty() {
                log::warn!(
                    "line {line}: skipping unreadable text {:?}",
                    raw.rest.trim()
                );
            }

            let tokens = raw
                .tokens
                .iter()
                .map(|w| session.tokens.intern(w))
                .collect();
            let mut tree = Tree::new(Sentence::new(trees.len(), tokens));
            for c in raw.constituents {
                if c.begin > c.end || c.end > tree.len() {
                    return Err(CorpusError::SpanOutOfRange {
                        line,
                        begin: c.begin,
                        end: c.end,
                        len: tree.len(),
                    });
                }
                let labels = c
                    .labels
                    .into_iter()
                    .map(|n| session.nonterminals.observe(n));
                if let Some(c) = Constituent::with_labels(c.begin, c.end, labels) {
                    tree.add(c);
                }
            }
            trees.push(tree);
        }

        if cursor > trees.len() {
            return Err(CorpusError::CursorOutOfRange {
                cursor,
                len: trees.len(),
            });
        }
        log::debug!(
            "read {} sentences, {} comment lines, cursor at {cursor}",
            trees.len(),
            comments.len()
        );
        Ok(Treebank::from_parts(trees, comments, cursor))
    }

    ///Writes every tree, one per line.
    pub fn write(&self, tokens: &Interner, mut w: impl Write) -> std::io::Result<()> {
        for tree in self.trees() {
            writeln!(w, "{}", tree.display(tokens))?;
        }
        Ok(())
    }

    ///Writes the cursor marker followed by the trees, in a form [`Treebank::parse`] resumes from.
    pub fn write_checkpoint(&self, tokens: &Interner, mut w: impl Write) -> std::io::Result<()> {
        writeln!(w, "{CHECKPOINT}{}", self.cursor())?;
        writeln!(w)?;
        self.write(tokens, &mut w)
    }

    ///Writes the run summary followed by the comments read with the corpus.
    pub fn write_header(&self, header: &RunHeader, mut w: impl Write) -> std::io::Result<()> {
        let RunHeader {
            program,
            elapsed,
            date,
            command,
            hypotheses,
        } = header;
        writeln!(
            w,
            "{COMMENT} {program} :: {:.3}s :: {date}",
            elapsed.as_secs_f64()
        )?;
        writeln!(w, "{COMMENT} {program} :: command call :: {command}")?;
        writeln!(w, "{COMMENT} {program} :: hyps generated :: {hypotheses}")?;
        for comment in self.comments() {
            writeln!(w, "{comment}")?;
        }
        Ok(())
    }

    pub fn write_json(&self, tokens: &Interner, w: impl Write) -> serde_json::Result<()> {
        let trees = self
            .trees()
            .iter()
            .map(|tree| JsonTree {
                tokens: tree
                    .sentence()
                    .tokens()
                    .iter()
                    .map(|t| tokens.resolve(*t))
                    .collect(),
                constituents: tree.constituents(),
            })
            .collect();
        serde_json::to_writer_pretty(
            w,
            &JsonTreebank {
                comments: self.comments(),
                trees,
            },
        )
    }
}

///Summary lines written at the top of an output corpus.
#[derive(Debug, Clone)]
pub struct RunHeader {
    pub program: String,
    pub elapsed: Duration,
    pub date: String,
    pub command: String,
    pub hypotheses: usize,
}

#[derive(Serialize)]
struct JsonTree<'a> {
    tokens: Vec<&'a str>,
    constituents: &'a [Constituent],
}

#[derive(Serialize)]
struct JsonTreebank<'a> {
    comments: &'a [String],
    trees: Vec<JsonTree<'a>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Nonterminal;
    use anyhow::Result;

    fn spans(tree: &Tree) -> Vec<(usize, usize, Vec<u64>)> {
        let mut v: Vec<_> = tree
            .constituents()
            .iter()
            .map(|c| {
                (
                    c.begin(),
                    c.end(),
                    c.labels().iter().map(Nonterminal::value).collect(),
                )
            })
            .collect();
        v.sort();
        v
    }

    #[test]
    fn parse_lines() -> Result<()> {
        let mut session = Session::new();
        let treebank = Treebank::parse(
            "# a comment\n\
             the cat sleeps @@@ (0,3,[0])(1,3,[4, 2])\n\
             \n\
             a dog  barks\n\
             dogs @@@ ( 0 , 1 , [ 5 ] ) (0,1,[6])\n",
            &mut session,
        )?;
        assert_eq!(treebank.len(), 3);
        assert_eq!(treebank.comments(), &["# a comment".to_string()]);
        assert_eq!(treebank.cursor(), 0);

        let first = &treebank.trees()[0];
        assert_eq!(first.sentence().id(), 0);
        assert_eq!(spans(first), vec![(0, 3, vec![0]), (1, 3, vec![4, 2])]);
        assert_eq!(treebank.trees()[1].len(), 3);
        assert!(treebank.trees()[1].constituents().is_empty());
        assert_eq!(spans(&treebank.trees()[2]), vec![(0, 1, vec![5, 6])]);
        assert_eq!(session.nonterminals.peek(), 7);
        Ok(())
    }

    #[test]
    fn trailing_garbage_is_skipped() -> Result<()> {
        let mut session = Session::new();
        let treebank = Treebank::parse("a b @@@ (0,1,[1]) (1,2,[x]) (0,2,[3])", &mut session)?;
        assert_eq!(spans(&treebank.trees()[0]), vec![(0, 1, vec![1])]);

        let treebank = Treebank::parse("a b @@@", &mut session)?;
        assert!(treebank.trees()[0].constituents().is_empty());
        Ok(())
    }

    #[test]
    fn fatal_lines() {
        let mut session = Session::new();
        assert!(matches!(
            Treebank::parse("a b\na b @@@ [1] (0,1,[1])", &mut session),
            Err(CorpusError::Syntax { line: 2, .. })
        ));
        assert!(matches!(
            Treebank::parse("a b @@@ (0,1,1)", &mut session),
            Err(CorpusError::Syntax { line: 1, .. })
        ));
        assert!(matches!(
            Treebank::parse(":one\na b", &mut session),
            Err(CorpusError::BadCheckpoint { line: 1, .. })
        ));
        assert_eq!(
            Treebank::parse("@@@ (0,1,[1])", &mut session).unwrap_err(),
            CorpusError::MissingSentence { line: 1 }
        );
        assert_eq!(
            Treebank::parse("a b @@@ (1,3,[1])", &mut session).unwrap_err(),
            CorpusError::SpanOutOfRange {
                line: 1,
                begin: 1,
                end: 3,
                len: 2
            }
        );
        assert_eq!(
            Treebank::parse(":3\na b", &mut session).unwrap_err(),
            CorpusError::CursorOutOfRange { cursor: 3, len: 1 }
        );
    }

    #[test]
    fn round_trip() -> Result<()> {
        let corpus = "the cat sleeps @@@ (0,3,[0])(1,3,[4,2])(2,2,[7])\nbirds sing\n";
        let mut session = Session::new();
        let treebank = Treebank::parse(corpus, &mut session)?;

        let mut out = vec![];
        treebank.write(&session.tokens, &mut out)?;
        let written = String::from_utf8(out)?;
        assert_eq!(written, corpus);

        let mut again = Session::new();
        let reparsed = Treebank::parse(&written, &mut again)?;
        for (a, b) in treebank.trees().iter().zip(reparsed.trees()) {
            assert_eq!(spans(a), spans(b));
        }
        Ok(())
    }

    #[test]
    fn colon_lines_after_the_first_tree_are_sentences() -> Result<()> {
        let mut session = Session::new();
        let treebank = Treebank::parse("a b\n:1 c", &mut session)?;
        assert_eq!(treebank.len(), 2);
        assert_eq!(treebank.cursor(), 0);
        let first = treebank.trees()[1].sentence().tokens()[0];
        assert_eq!(session.tokens.resolve(first), ":1");
        Ok(())
    }

    #[test]
    fn checkpoint_resumes() -> Result<()> {
        let mut session = Session::new();
        let mut treebank = Treebank::parse("a b\nb c\nc d", &mut session)?;
        treebank.set_cursor(2);

        let mut out = vec![];
        treebank.write_checkpoint(&session.tokens, &mut out)?;
        let written = String::from_utf8(out)?;
        assert!(written.starts_with(":2\n\n"));

        let resumed = Treebank::parse(&written, &mut Session::new())?;
        assert_eq!(resumed.cursor(), 2);
        assert_eq!(resumed.len(), 3);
        Ok(())
    }

    #[test]
    fn header_and_json() -> Result<()> {
        let mut session = Session::new();
        let treebank = Treebank::parse("# kept\nx y @@@ (0,2,[0])", &mut session)?;
        let header = RunHeader {
            program: "align".to_string(),
            elapsed: Duration::from_millis(1500),
            date: "today".to_string(),
            command: "align -a wm".to_string(),
            hypotheses: 4,
        };
        let mut out = vec![];
        treebank.write_header(&header, &mut out)?;
        assert_eq!(
            String::from_utf8(out)?,
            "# align :: 1.500s :: today\n\
             # align :: command call :: align -a wm\n\
             # align :: hyps generated :: 4\n\
             # kept\n"
        );

        let mut out = vec![];
        treebank.write_json(&session.tokens, &mut out)?;
        let value: serde_json::Value = serde_json::from_slice(&out)?;
        assert_eq!(value["trees"][0]["tokens"][1], "y");
        assert_eq!(value["trees"][0]["constituents"][0]["end"], 2);
        assert_eq!(value["trees"][0]["constituents"][0]["labels"][0], 0);
        Ok(())
    }
}
