// src/module/loader.rs
//! Loads a root module and everything it imports, depth first.
//!
//! Import paths are relative, `./`-prefixed, and resolved against the
//! importing file's directory; a path that does not name an existing
//! file is retried with the `.spn` extension appended. Re-imports and
//! import cycles are allowed: a module already seen is simply skipped,
//! so the module list comes out in dependency post-order with the root
//! last. Every resolved path is written back into its import statement
//! so later passes can map imports to loaded modules by path alone.

use std::path::Path;

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::errors::{LoaderError, Sourced};
use crate::frontend::ast::{ImportStmt, ModuleAst, Stmt};
use crate::frontend::{tokenize, Interner, Parser};

/// One loaded and parsed source file
#[derive(Debug)]
pub struct Module {
    pub path: String,
    pub source: String,
    pub ast: ModuleAst,
}

/// A whole program: the root module plus its transitive imports
#[derive(Debug)]
pub struct Project {
    /// Dependency post-order; the root module is last
    pub modules: Vec<Module>,
    pub interner: Interner,
}

impl Project {
    /// Load a project from an already-read root source file.
    ///
    /// The caller reads the root itself so that a missing input file
    /// can be reported without source attached; everything reachable
    /// from here has an import site to point at.
    pub fn load(root_path: &str, root_source: String) -> Result<Project, Sourced> {
        let mut loader = Loader {
            interner: Interner::new(),
            parsed: FxHashSet::default(),
            modules: Vec::new(),
        };
        loader.load_module(root_path.to_string(), root_source)?;
        Ok(Project {
            modules: loader.modules,
            interner: loader.interner,
        })
    }

    /// Find a loaded module by its resolved path
    pub fn module_index(&self, path: &str) -> Option<usize> {
        self.modules.iter().position(|module| module.path == path)
    }
}

struct Loader {
    interner: Interner,
    parsed: FxHashSet<String>,
    modules: Vec<Module>,
}

impl Loader {
    fn load_module(&mut self, path: String, source: String) -> Result<(), Sourced> {
        self.parsed.insert(path.clone());
        debug!(path, "loading module");

        let tokens = match tokenize(&source) {
            Ok(tokens) => tokens,
            Err(error) => return Err(Sourced::new(&path, &source, error)),
        };
        let mut parser = Parser::new(tokens, &mut self.interner);
        let mut ast = match parser.parse_module() {
            Ok(ast) => ast,
            Err(error) => return Err(Sourced::new(&path, &source, error)),
        };

        for statement in &mut ast.block.statements {
            let Stmt::Import(import) = statement else {
                continue;
            };
            let resolved = match resolve_import(&path, import) {
                Ok(resolved) => resolved,
                Err(error) => return Err(Sourced::new(&path, &source, error)),
            };
            import.from = resolved.clone();
            if self.parsed.contains(&resolved) {
                continue;
            }
            let imported_source = match std::fs::read_to_string(&resolved) {
                Ok(imported_source) => imported_source,
                Err(error) => {
                    return Err(Sourced::new(
                        &path,
                        &source,
                        LoaderError::Read {
                            path: resolved,
                            message: error.to_string(),
                            span: import.span.into(),
                        },
                    ));
                }
            };
            self.load_module(resolved, imported_source)?;
        }

        self.modules.push(Module { path, source, ast });
        Ok(())
    }
}

/// Resolve an import path against the importing file's directory
fn resolve_import(importer: &str, import: &ImportStmt) -> Result<String, LoaderError> {
    if !import.from.starts_with("./") {
        return Err(LoaderError::UnsupportedImportPath {
            path: import.from.clone(),
            span: import.span.into(),
        });
    }

    let directory = match Path::new(importer).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_string_lossy().into_owned(),
        _ => ".".to_string(),
    };
    // "./x" keeps its slash when appended to the directory
    let mut resolved = format!("{}{}", directory, &import.from[1..]);

    if !resolved.ends_with(".spn") && !Path::new(&resolved).exists() {
        resolved.push_str(".spn");
    }
    if !Path::new(&resolved).exists() {
        return Err(LoaderError::ModuleNotFound {
            path: resolved,
            span: import.span.into(),
        });
    }
    Ok(resolved)
}
