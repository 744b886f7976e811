//! Reference entries for q's built-in keywords, offered by completion and
//! shown on hover.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Builtin {
    pub name: &'static str,
    pub signature: &'static str,
    pub detail: &'static str,
}

const fn builtin(name: &'static str, signature: &'static str, detail: &'static str) -> Builtin {
    Builtin {
        name,
        signature,
        detail,
    }
}

/// Sorted by name so lookups can binary search.
pub const BUILTINS: &[Builtin] = &[
    builtin("abs", "abs x", "absolute value"),
    builtin("aj", "aj[c;t1;t2]", "as-of join"),
    builtin("all", "all x", "1b if every item of x is non-zero"),
    builtin("and", "x and y", "lesser of x and y"),
    builtin("any", "any x", "1b if some item of x is non-zero"),
    builtin("asc", "asc x", "ascending sort"),
    builtin("avg", "avg x", "arithmetic mean"),
    builtin("cols", "cols x", "column names of a table"),
    builtin("count", "count x", "number of items"),
    builtin("cross", "x cross y", "cross product"),
    builtin("cut", "x cut y", "cut y at the indexes x"),
    builtin("delete", "delete c from t where p", "remove rows or columns"),
    builtin("desc", "desc x", "descending sort"),
    builtin("distinct", "distinct x", "unique items of x"),
    builtin("each", "f each x", "apply f to each item of x"),
    builtin("enlist", "enlist x", "list with x as its only item"),
    builtin("except", "x except y", "items of x not in y"),
    builtin("exec", "exec c by g from t where p", "select returning a dictionary or list"),
    builtin("exit", "exit x", "terminate the process with code x"),
    builtin("first", "first x", "first item of x"),
    builtin("flip", "flip x", "transpose"),
    builtin("get", "get x", "value of a variable or file"),
    builtin("group", "group x", "dictionary of item indexes"),
    builtin("if", "if[c;e1;...]", "conditional evaluation"),
    builtin("in", "x in y", "whether items of x occur in y"),
    builtin("inter", "x inter y", "items common to x and y"),
    builtin("key", "key x", "keys of a dictionary or keyed table"),
    builtin("last", "last x", "last item of x"),
    builtin("like", "x like y", "pattern match on strings"),
    builtin("lj", "x lj y", "left join"),
    builtin("max", "max x", "maximum"),
    builtin("min", "min x", "minimum"),
    builtin("neg", "neg x", "negate"),
    builtin("not", "not x", "logical not"),
    builtin("or", "x or y", "greater of x and y"),
    builtin("over", "f over x", "reduce"),
    builtin("raze", "raze x", "join items of x"),
    builtin("reverse", "reverse x", "reverse the order of items"),
    builtin("scan", "f scan x", "running reduce"),
    builtin("select", "select c by g from t where p", "query a table"),
    builtin("set", "x set y", "assign y to the global or file named x"),
    builtin("show", "show x", "print x to the console"),
    builtin("string", "string x", "cast to string"),
    builtin("sum", "sum x", "total"),
    builtin("system", "system x", "execute a system command"),
    builtin("til", "til x", "first x natural numbers"),
    builtin("type", "type x", "datatype of x"),
    builtin("union", "x union y", "distinct items of x and y"),
    builtin("update", "update c by g from t where p", "modify table columns"),
    builtin("upsert", "x upsert y", "insert or update"),
    builtin("value", "value x", "evaluate a string or get a dictionary's values"),
    builtin("where", "where x", "indexes of true items"),
    builtin("while", "while[c;e1;...]", "loop while c is true"),
    builtin("within", "x within y", "whether x lies within the range y"),
    builtin("xasc", "c xasc t", "sort a table ascending by columns"),
    builtin("xdesc", "c xdesc t", "sort a table descending by columns"),
];

pub fn find_builtin(name: &str) -> Option<&'static Builtin> {
    BUILTINS
        .binary_search_by(|builtin| builtin.name.cmp(name))
        .ok()
        .map(|index| &BUILTINS[index])
}

pub fn builtins_with_prefix(prefix: &str) -> impl Iterator<Item = &'static Builtin> + '_ {
    BUILTINS
        .iter()
        .filter(move |builtin| builtin.name.starts_with(prefix))
}
