//! The table facade and the write path of the B-tree.
//!
//! A table is one B-tree stored in one file. Page 0 is the root for the
//! lifetime of the database: when the root leaf splits, its contents move
//! to a fresh page and page 0 is rebuilt as an internal node on top.

use super::btree::{
    NodeType, LEAF_NODE_LEFT_SPLIT_COUNT, LEAF_NODE_MAX_CELLS, LEAF_NODE_RIGHT_SPLIT_COUNT,
};
use super::cursor::Cursor;
use super::pager::Pager;
use super::row::{deserialize_row, serialize_row, Row};
use crate::errors::Error;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Outcome of an insert, as seen by the statement executor.
///
/// `TableFull` is a leftover from the flat-array storage this engine grew
/// out of; the tree path never produces it, but the executor still knows
/// how to report it.
#[derive(Debug, PartialEq, Eq)]
pub enum ExecuteResult {
    Success,
    DuplicateKey,
    TableFull,
}

pub struct Table {
    pub path: PathBuf,
    pub root_page_num: u32,
    pub pager: Pager,
}

impl Table {
    /// Opens the database file. An empty file gets page 0 initialized as
    /// an empty leaf root.
    pub fn open(path: impl Into<PathBuf>) -> Result<Table, Error> {
        let path = path.into();
        let mut pager = Pager::open(&path)?;

        if pager.num_pages() == 0 {
            let root = pager.page_mut(0)?;
            root.initialize_leaf();
            root.set_root(true);
        }

        info!(path = %path.display(), "Opened table.");
        Ok(Table {
            path,
            root_page_num: 0,
            pager,
        })
    }

    /// Flushes every resident page and releases the file. All rows
    /// inserted so far are durable after this returns.
    pub fn close(mut self) -> Result<(), Error> {
        self.pager.flush_all()?;
        info!(path = %self.path.display(), "Closed table.");
        Ok(())
    }

    /// A cursor at the position of `key`, or where it would go.
    pub fn find(&mut self, key: u32) -> Result<Cursor<'_>, Error> {
        Cursor::find(self, key)
    }

    /// A cursor at the first row of the table.
    pub fn start(&mut self) -> Result<Cursor<'_>, Error> {
        Cursor::start(self)
    }
}

/// Inserts a row keyed by its id. Rejects an id that is already present;
/// splits the target leaf when it is full.
pub fn insert_row(table: &mut Table, row: &Row) -> Result<ExecuteResult, Error> {
    let key = row.id;
    debug!(key, "Inserting a row...");

    let mut cursor = Cursor::find(table, key)?;
    {
        let node = cursor.table.pager.page(cursor.page_num)?;
        let num_cells = node.leaf_num_cells();
        if cursor.cell_num < num_cells && node.leaf_key(cursor.cell_num)? == key {
            return Ok(ExecuteResult::DuplicateKey);
        }
    }

    leaf_node_insert(&mut cursor, key, row)?;
    Ok(ExecuteResult::Success)
}

/// Reads every row in ascending key order by walking a cursor from the
/// start of the table.
pub fn select_rows(table: &mut Table) -> Result<Vec<Row>, Error> {
    let mut rows = Vec::new();
    let mut buf = Vec::new();

    let mut cursor = Cursor::start(table)?;
    while !cursor.end_of_table {
        cursor.read_value(&mut buf)?;
        rows.push(deserialize_row(&buf));
        cursor.advance()?;
    }
    Ok(rows)
}

fn leaf_node_insert(cursor: &mut Cursor, key: u32, row: &Row) -> Result<(), Error> {
    let num_cells = cursor.table.pager.page(cursor.page_num)?.leaf_num_cells();
    if num_cells as usize >= LEAF_NODE_MAX_CELLS {
        warn!(
            page_num = cursor.page_num,
            num_cells, "Leaf node full. Splitting..."
        );
        return leaf_node_split_and_insert(cursor, key, row);
    }

    let node = cursor.table.pager.page_mut(cursor.page_num)?;
    if cursor.cell_num < num_cells {
        // Make room for the new cell.
        for i in (cursor.cell_num + 1..=num_cells).rev() {
            let prev = node.leaf_cell(i - 1)?.to_vec();
            node.leaf_cell_mut(i)?.copy_from_slice(&prev);
        }
    }

    node.set_leaf_num_cells(num_cells + 1);
    node.set_leaf_key(cursor.cell_num, key)?;
    serialize_row(row, node.leaf_value_mut(cursor.cell_num)?);
    Ok(())
}

/// Create a new node and move half the cells over. Insert the new value
/// in one of the two nodes. Update the parent or create a new parent.
fn leaf_node_split_and_insert(cursor: &mut Cursor, key: u32, row: &Row) -> Result<(), Error> {
    let new_page_num = cursor.table.pager.get_unused_page_num();
    debug!(
        old_page = cursor.page_num,
        new_page = new_page_num,
        "Splitting leaf node..."
    );

    // Snapshot the full leaf; the redistribution below reads from it
    // while both destination pages are being rewritten.
    let old = cursor.table.pager.page(cursor.page_num)?.clone();
    cursor.table.pager.page_mut(new_page_num)?.initialize_leaf();

    // All existing keys plus the new key are divided evenly between the
    // old (left) and new (right) nodes. Starting from the right, each
    // cell is moved to its final position.
    for i in (0..=LEAF_NODE_MAX_CELLS).rev() {
        let destination_page = if i >= LEAF_NODE_LEFT_SPLIT_COUNT {
            new_page_num
        } else {
            cursor.page_num
        };
        let index_within_node = (i % LEAF_NODE_LEFT_SPLIT_COUNT) as u32;

        let destination = cursor.table.pager.page_mut(destination_page)?;
        if i == cursor.cell_num as usize {
            destination.set_leaf_key(index_within_node, key)?;
            serialize_row(row, destination.leaf_value_mut(index_within_node)?);
        } else if i > cursor.cell_num as usize {
            destination
                .leaf_cell_mut(index_within_node)?
                .copy_from_slice(old.leaf_cell(i as u32 - 1)?);
        } else {
            destination
                .leaf_cell_mut(index_within_node)?
                .copy_from_slice(old.leaf_cell(i as u32)?);
        }
    }

    cursor
        .table
        .pager
        .page_mut(cursor.page_num)?
        .set_leaf_num_cells(LEAF_NODE_LEFT_SPLIT_COUNT as u32);
    cursor
        .table
        .pager
        .page_mut(new_page_num)?
        .set_leaf_num_cells(LEAF_NODE_RIGHT_SPLIT_COUNT as u32);

    if old.is_root() {
        create_new_root(cursor.table, new_page_num)
    } else {
        Err(err!(
            Unimplemented,
            "Need to implement updating parent after split"
        ))
    }
}

/// Handles splitting the root. The old root is copied to a new page and
/// becomes the left child; the right child is passed in. Page 0 is then
/// re-initialized as an internal node with the two children, so the root
/// page number never changes while the tree grows by one level.
fn create_new_root(table: &mut Table, right_child_page_num: u32) -> Result<(), Error> {
    debug!(right_child_page_num, "Creating a new root.");

    let root_snapshot = table.pager.page(table.root_page_num)?.clone();
    let left_child_page_num = table.pager.get_unused_page_num();

    {
        let left_child = table.pager.page_mut(left_child_page_num)?;
        *left_child.as_bytes_mut() = *root_snapshot.as_bytes();
        left_child.set_root(false);
    }
    let left_child_max_key = table.pager.page(left_child_page_num)?.max_key()?;

    let root = table.pager.page_mut(table.root_page_num)?;
    root.initialize_internal();
    root.set_root(true);
    root.set_internal_num_keys(1);
    root.set_internal_child(0, left_child_page_num)?;
    root.set_internal_key(0, left_child_max_key)?;
    root.set_internal_right_child(right_child_page_num);
    Ok(())
}

/// Renders the tree for the `.btree` meta-command: two spaces of indent
/// per level, each child subtree printed before its separator key, the
/// rightmost child last.
pub fn tree_report(table: &mut Table) -> Result<String, Error> {
    let mut out = String::new();
    print_tree(&mut table.pager, table.root_page_num, 0, &mut out)?;
    Ok(out)
}

fn indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str("  ");
    }
}

fn print_tree(
    pager: &mut Pager,
    page_num: u32,
    indentation_level: usize,
    out: &mut String,
) -> Result<(), Error> {
    enum Dump {
        Leaf {
            keys: Vec<u32>,
        },
        Internal {
            entries: Vec<(u32, u32)>, // (child page, separator key)
            right_child: u32,
        },
    }

    let dump = {
        let node = pager.page(page_num)?;
        match node.node_type()? {
            NodeType::Leaf => {
                let num_cells = node.leaf_num_cells();
                let mut keys = Vec::with_capacity(num_cells as usize);
                for i in 0..num_cells {
                    keys.push(node.leaf_key(i)?);
                }
                Dump::Leaf { keys }
            }
            NodeType::Internal => {
                let num_keys = node.internal_num_keys();
                let mut entries = Vec::with_capacity(num_keys as usize);
                for i in 0..num_keys {
                    entries.push((node.internal_child(i)?, node.internal_key(i)?));
                }
                Dump::Internal {
                    entries,
                    right_child: node.internal_right_child(),
                }
            }
        }
    };

    match dump {
        Dump::Leaf { keys } => {
            indent(out, indentation_level);
            out.push_str(&format!("- leaf (size {})\n", keys.len()));
            for key in keys {
                indent(out, indentation_level + 1);
                out.push_str(&format!("- {}\n", key));
            }
        }
        Dump::Internal {
            entries,
            right_child,
        } => {
            indent(out, indentation_level);
            out.push_str(&format!("- internal (size {})\n", entries.len()));
            for (child, key) in entries {
                print_tree(pager, child, indentation_level + 1, out)?;
                indent(out, indentation_level + 1);
                out.push_str(&format!("- key {}\n", key));
            }
            print_tree(pager, right_child, indentation_level + 1, out)?;
        }
    }
    Ok(())
}
