//! Tree builder: link every non-root entity into the fields of its parent.
//!
//! A child is embedded into each parent field whose path equals the child's header
//! path. Parents must be declared before their children, so one left-to-right pass
//! validates everything and the forest is then assembled back to front.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::ast::*;
use crate::error::{DefError, Result};

/// Build the root forest from the flat entity list (input order).
pub fn build_tree(entities: Vec<Entity>) -> Result<DefForest> {
    if entities.is_empty() {
        return Err(DefError::NoEntities);
    }
    let links = resolve_links(&entities)?;
    if !links.unlinked.is_empty() {
        let codes: Vec<&str> = links
            .unlinked
            .iter()
            .map(|&i| entities[i].header.code.as_str())
            .collect();
        warn!(count = codes.len(), ?codes, "entities left out of the forest");
    }
    Ok(assemble(entities, links))
}

/// Parent/child structure found by the validation pass, by entity index.
#[derive(Debug, Default)]
struct Links {
    roots: Vec<usize>,
    /// Linked children per entity index, in input order.
    children: Vec<Vec<usize>>,
    /// Non-root entities left out of the forest, in input order.
    unlinked: Vec<usize>,
}

fn resolve_links(entities: &[Entity]) -> Result<Links> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    // (parent index, path) -> code of the child that claimed it
    let mut claimed: HashMap<(usize, &str), &str> = HashMap::new();
    let mut lost: HashSet<usize> = HashSet::new();
    let mut links = Links {
        roots: Vec::new(),
        children: vec![Vec::new(); entities.len()],
        unlinked: Vec::new(),
    };

    for (i, entity) in entities.iter().enumerate() {
        let code = entity.header.code.as_str();
        if seen.contains_key(code) {
            return Err(DefError::DuplicateCode {
                code: code.to_string(),
            });
        }

        match &entity.header.parent {
            ParentCode::Root => links.roots.push(i),
            ParentCode::Code(parent_code) => {
                let parent_idx = parent_index(entities, &seen, i, parent_code)?;
                let parent = &entities[parent_idx];
                let path = entity.header.path.as_str();
                if lost.contains(&parent_idx) {
                    warn!(
                        child = code,
                        parent = %parent_code,
                        "parent is not part of the forest; child dropped with it"
                    );
                    lost.insert(i);
                    links.unlinked.push(i);
                } else if parent.fields.iter().any(|f| f.path == path) {
                    if let Some(first) = claimed.insert((parent_idx, path), code) {
                        return Err(DefError::AmbiguousEmbedding {
                            parent: parent_code.clone(),
                            path: path.to_string(),
                            first: first.to_string(),
                            second: code.to_string(),
                        });
                    }
                    debug!(child = code, parent = %parent_code, path, "embedding child");
                    links.children[parent_idx].push(i);
                } else {
                    warn!(
                        child = code,
                        parent = %parent_code,
                        path,
                        "no field of the parent matches the child's path; child left unlinked"
                    );
                    lost.insert(i);
                    links.unlinked.push(i);
                }
            }
        }

        seen.insert(code, i);
    }
    Ok(links)
}

fn parent_index(
    entities: &[Entity],
    seen: &HashMap<&str, usize>,
    child_idx: usize,
    parent_code: &str,
) -> Result<usize> {
    let child = &entities[child_idx];
    if parent_code == child.header.code {
        return Err(DefError::SelfParent {
            code: child.header.code.clone(),
        });
    }
    if let Some(&idx) = seen.get(parent_code) {
        return Ok(idx);
    }
    let declared_later = entities[child_idx + 1..]
        .iter()
        .any(|e| e.header.code == parent_code);
    if declared_later {
        Err(DefError::ForwardParent {
            code: child.header.code.clone(),
            parent: parent_code.to_string(),
        })
    } else {
        Err(DefError::UnknownParent {
            code: child.header.code.clone(),
            parent: parent_code.to_string(),
        })
    }
}

/// Children always follow their parent, so walking back to front completes every
/// child before it is moved into its parent.
fn assemble(entities: Vec<Entity>, links: Links) -> DefForest {
    let Links { roots, children, .. } = links;
    let mut slots: Vec<Option<Entity>> = entities.into_iter().map(Some).collect();

    for (idx, kids) in children.into_iter().enumerate().rev() {
        if kids.is_empty() {
            continue;
        }
        let Some(mut parent) = slots[idx].take() else {
            continue;
        };
        for kid in kids {
            if let Some(child) = slots[kid].take() {
                embed(&mut parent, child);
            }
        }
        slots[idx] = Some(parent);
    }

    let roots = roots.into_iter().filter_map(|i| slots[i].take()).collect();
    DefForest::from_roots(roots)
}

/// Install `child` into every field of `parent` whose path matches the child's path.
/// Matching fields share one node.
fn embed(parent: &mut Entity, child: Entity) {
    let child = Arc::new(child);
    for field in parent
        .fields
        .iter_mut()
        .filter(|f| f.path == child.header.path)
    {
        field.embedded = Some(Arc::clone(&child));
    }
}
