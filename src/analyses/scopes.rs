use smol_str::SmolStr;

use crate::ast::{Block, Stmt};

/// Resolve the names a block declares directly: hoisted function
/// declarations first (they're visible before their statement), then
/// variable declarators in statement order. Duplicates keep their first
/// position.
///
/// The transform driver re-runs this for a block after splicing in a rewrite,
/// since the rewrite moves declarations into continuation bodies.
pub fn declared_names(block: &Block) -> Vec<SmolStr> {
    let mut names = Vec::new();
    let mut add = |names: &mut Vec<SmolStr>, name: &SmolStr| {
        if !names.contains(name) {
            names.push(name.clone());
        }
    };
    for stmt in &block.stmts {
        if let Stmt::FunctionDecl { func, .. } = stmt {
            if let Some(name) = &func.name {
                add(&mut names, &name.name);
            }
        }
    }
    for stmt in &block.stmts {
        if let Stmt::VarDecl { decls, .. } = stmt {
            for decl in decls {
                add(&mut names, &decl.name.name);
            }
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use crate::syntax::{parse, Dialect};

    use super::*;

    #[test]
    fn hoisted_functions_come_first() {
        let program = parse(
            "let a = 1;\nfunction f() { }\nlet b = 2, a = 3;",
            Dialect::Plain,
        )
        .unwrap();
        let names = declared_names(&program.body);
        let names: Vec<&str> = names.iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["f", "a", "b"]);
    }

    #[test]
    fn nested_blocks_are_not_resolved() {
        let program = parse("function f() { let inner = 1; }", Dialect::Plain).unwrap();
        let names = declared_names(&program.body);
        let names: Vec<&str> = names.iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["f"]);
    }
}
