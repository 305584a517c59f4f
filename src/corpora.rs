//! A few small corpora that can be useful in testing or otherwise.

///Sentences generated by the grammar from Stabler (2013), one per line.
///
/// - Stabler, E. (2013). Two Models of Minimalist, Incremental Syntactic Analysis. Topics in Cognitive Science, 5(3), 611–633. <https://doi.org/10.1111/tops.12031>
pub const STABLER2013: &str = "the king drinks the beer
the queen drinks the wine
the king prefers the queen
which king drinks the beer
the queen knows the king drinks the wine
the king says the queen prefers the beer
which wine the king prefers";

///Minimal pairs from van Zaanen (2000), where a single substitution marks a constituent.
///
/// - van Zaanen, M. (2000). ABL: Alignment-Based Learning. COLING 2000. <https://aclanthology.org/C00-2139>
pub const MINIMAL_PAIRS: &str = "show me flights from Atlanta to Boston
show me the rates for flight 1943
show me flights from Denver to Boston
what is the cheapest flight from Atlanta
what is the latest flight from Denver";

///An annotated treebank with a comment header, as written by a previous run.
pub const ANNOTATED: &str = "# align :: command call :: align -a wm
the cat sleeps @@@ (0,3,[0])(1,2,[1])
the dog sleeps @@@ (0,3,[0])(1,2,[1])
a dog barks @@@ (0,3,[0])";
