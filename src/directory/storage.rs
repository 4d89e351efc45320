use super::dn::{Dn, Rdn};
use super::entry::LdapEntry;
use super::schema::Schema;
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    BaseObject = 0,
    SingleLevel = 1,
    #[default]
    WholeSubtree = 2,
}

impl std::str::FromStr for SearchScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "base" | "baseobject" | "0" => Ok(Self::BaseObject),
            "one" | "onelevel" | "singlelevel" | "1" => Ok(Self::SingleLevel),
            "sub" | "subtree" | "wholesubtree" | "2" => Ok(Self::WholeSubtree),
            other => Err(format!("unknown search scope: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RenameOptions {
    pub delete_old_rdn: bool,
    pub new_superior: Option<Dn>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RenameError {
    #[error("Entry {0} not found")]
    NoSuchObject(String),

    #[error("Entry {0} already exists")]
    AlreadyExists(String),

    #[error("Cannot move {0} below itself")]
    IntoOwnSubtree(String),
}

#[derive(Debug, Clone)]
struct Node {
    dn: Dn,
    entry: LdapEntry,
}

/// The entries of one target, keyed by normalized DN.
///
/// Iteration follows insertion order; a renamed entry keeps its place.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    nodes: BTreeMap<u64, Node>,
    index: HashMap<String, u64>,
    next_seq: u64,
    schema: Option<Schema>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    pub fn set_schema(&mut self, schema: Option<Schema>) {
        self.schema = schema;
    }

    pub fn contains(&self, dn: &Dn) -> bool {
        self.index.contains_key(&dn.normalized())
    }

    pub fn get(&self, dn: &Dn) -> Option<&LdapEntry> {
        let seq = self.index.get(&dn.normalized())?;
        self.nodes.get(seq).map(|n| &n.entry)
    }

    pub fn get_mut(&mut self, dn: &Dn) -> Option<&mut LdapEntry> {
        let seq = self.index.get(&dn.normalized())?;
        self.nodes.get_mut(seq).map(|n| &mut n.entry)
    }

    /// Looks up an entry by its string DN; unparsable DNs find nothing.
    pub fn get_entry(&self, dn: &str) -> Option<LdapEntry> {
        let dn = Dn::parse(dn).ok()?;
        self.get(&dn).cloned()
    }

    pub fn entry_exists(&self, dn: &str) -> bool {
        Dn::parse(dn).map(|dn| self.contains(&dn)).unwrap_or(false)
    }

    /// Stores `entry` under `dn`, replacing an existing entry in place. The
    /// entry's DN is rewritten to the canonical form of `dn`.
    pub fn put(&mut self, dn: Dn, mut entry: LdapEntry) {
        entry.dn = dn.to_string();
        let key = dn.normalized();
        let node = Node { dn, entry };
        match self.index.get(&key) {
            Some(seq) => {
                self.nodes.insert(*seq, node);
            }
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.index.insert(key, seq);
                self.nodes.insert(seq, node);
            }
        }
    }

    pub fn remove(&mut self, dn: &Dn) -> Option<LdapEntry> {
        let seq = self.index.remove(&dn.normalized())?;
        self.nodes.remove(&seq).map(|n| n.entry)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.index.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &LdapEntry> {
        self.nodes.values().map(|n| &n.entry)
    }

    /// Renames `old` to `new_rdn` (below `options.new_superior` when given)
    /// and re-keys every descendant. Returns the new DN.
    pub fn rename(&mut self, old: &Dn, new_rdn: &Rdn, options: &RenameOptions) -> Result<Dn, RenameError> {
        let old_key = old.normalized();
        let Some(&root_seq) = self.index.get(&old_key) else {
            return Err(RenameError::NoSuchObject(old.to_string()));
        };

        let parent = match &options.new_superior {
            Some(superior) => {
                if superior == old || superior.is_descendant_of(old) {
                    return Err(RenameError::IntoOwnSubtree(old.to_string()));
                }
                superior.clone()
            }
            None => old.parent().unwrap_or_default(),
        };
        let new_dn = Dn::child_of(new_rdn.clone(), &parent);

        let moved: Vec<(u64, Dn)> = self
            .nodes
            .iter()
            .filter(|(seq, node)| **seq == root_seq || node.dn.is_descendant_of(old))
            .filter_map(|(seq, node)| node.dn.replace_suffix(old, &new_dn).map(|dn| (*seq, dn)))
            .collect();
        let moved_seqs: HashSet<u64> = moved.iter().map(|(seq, _)| *seq).collect();

        for (_, dn) in &moved {
            if let Some(existing) = self.index.get(&dn.normalized()) {
                if !moved_seqs.contains(existing) {
                    return Err(RenameError::AlreadyExists(dn.to_string()));
                }
            }
        }

        for (seq, _) in &moved {
            if let Some(node) = self.nodes.get(seq) {
                self.index.remove(&node.dn.normalized());
            }
        }
        for (seq, dn) in moved {
            self.index.insert(dn.normalized(), seq);
            if let Some(node) = self.nodes.get_mut(&seq) {
                node.entry.dn = dn.to_string();
                node.dn = dn;
            }
        }

        if let Some(node) = self.nodes.get_mut(&root_seq) {
            if options.delete_old_rdn {
                if let Some(old_rdn) = old.rdn() {
                    for ava in old_rdn.avas() {
                        node.entry.delete_values(&ava.attr, &[ava.value.clone()]);
                    }
                }
            }
            for ava in new_rdn.avas() {
                node.entry.add_values(&ava.attr, &[ava.value.clone()]);
            }
        }

        Ok(new_dn)
    }

    pub fn search_entries<F>(&self, base: &Dn, scope: SearchScope, filter: F) -> Vec<LdapEntry>
    where
        F: Fn(&LdapEntry) -> bool,
    {
        self.nodes
            .values()
            .filter(|node| match scope {
                SearchScope::BaseObject => node.dn == *base,
                SearchScope::SingleLevel => node.dn.is_child_of(base),
                SearchScope::WholeSubtree => node.dn == *base || node.dn.is_descendant_of(base),
            })
            .filter(|node| filter(&node.entry))
            .map(|node| node.entry.clone())
            .collect()
    }
}
