//! # Database Cursor Module
//!
//! A cursor is a transient position inside the tree: a page number, a
//! cell number inside that leaf, and an end-of-table flag. Cursors are
//! created per operation and discarded afterwards; a split can relocate
//! logical positions, so they are never reused across mutations.

use super::btree::NodeType;
use super::table::Table;
use crate::errors::Error;
use tracing::trace;

/// Represents a position within a database table.
///
/// The cursor borrows the table mutably for its entire lifetime, so the
/// tree cannot change underneath it except through the cursor itself.
pub struct Cursor<'a> {
    /// The table being navigated.
    pub table: &'a mut Table,

    /// Page number of the leaf the cursor points into.
    pub page_num: u32,

    /// Cell number within that leaf.
    pub cell_num: u32,

    /// Indicates a position one past the last element.
    pub end_of_table: bool,
}

/// Walks from the root down to the leaf that owns `key` and binary
/// searches the leaf. Returns the page and the first cell whose key is
/// >= `key` (the insertion position), or the leaf's cell count when
/// every key is smaller.
fn descend_to_leaf(table: &mut Table, key: u32) -> Result<(u32, u32), Error> {
    let mut page_num = table.root_page_num;
    loop {
        let node = table.pager.page(page_num)?;
        let next = match node.node_type()? {
            NodeType::Leaf => None,
            NodeType::Internal => {
                let child_index = node.internal_find_child(key)?;
                Some(node.internal_child(child_index)?)
            }
        };
        match next {
            Some(child) => page_num = child,
            None => break,
        }
    }

    let node = table.pager.page(page_num)?;
    let mut min_index = 0;
    let mut one_past_max_index = node.leaf_num_cells();
    while one_past_max_index != min_index {
        let index = (min_index + one_past_max_index) / 2;
        let key_at_index = node.leaf_key(index)?;
        if key == key_at_index {
            return Ok((page_num, index));
        }
        if key < key_at_index {
            one_past_max_index = index;
        } else {
            min_index = index + 1;
        }
    }
    Ok((page_num, min_index))
}

impl<'a> Cursor<'a> {
    /// A cursor on the first row of the table, reached by following the
    /// leftmost child pointers down to a leaf.
    pub fn start(table: &'a mut Table) -> Result<Self, Error> {
        let mut page_num = table.root_page_num;
        loop {
            let node = table.pager.page(page_num)?;
            let next = match node.node_type()? {
                NodeType::Leaf => None,
                NodeType::Internal => Some(node.internal_child(0)?),
            };
            match next {
                Some(child) => page_num = child,
                None => break,
            }
        }

        let num_cells = table.pager.page(page_num)?.leaf_num_cells();
        Ok(Cursor {
            table,
            page_num,
            cell_num: 0,
            end_of_table: num_cells == 0,
        })
    }

    /// The position of `key`, or where it would be inserted. Internal
    /// nodes are routed through their separators on the way down.
    pub fn find(table: &'a mut Table, key: u32) -> Result<Self, Error> {
        let (page_num, cell_num) = descend_to_leaf(table, key)?;
        trace!(key, page_num, cell_num, "Positioned cursor.");
        Ok(Cursor {
            table,
            page_num,
            cell_num,
            end_of_table: false,
        })
    }

    /// Copies the serialized row under the cursor into `buf`.
    pub fn read_value(&mut self, buf: &mut Vec<u8>) -> Result<(), Error> {
        let node = self.table.pager.page(self.page_num)?;
        let value = node.leaf_value(self.cell_num)?;
        buf.clear();
        buf.extend_from_slice(value);
        Ok(())
    }

    /// Moves to the next cell. The leaf layout carries no sibling
    /// pointer, so when a leaf runs out the cursor descends the tree
    /// again for the first key past this leaf's maximum.
    pub fn advance(&mut self) -> Result<(), Error> {
        let (num_cells, last_key) = {
            let node = self.table.pager.page(self.page_num)?;
            let num_cells = node.leaf_num_cells();
            let last_key = if num_cells == 0 {
                None
            } else {
                Some(node.leaf_key(num_cells - 1)?)
            };
            (num_cells, last_key)
        };

        self.cell_num += 1;
        if self.cell_num < num_cells {
            return Ok(());
        }

        let last_key = match last_key {
            Some(key) => key,
            None => {
                self.end_of_table = true;
                return Ok(());
            }
        };
        let target = match last_key.checked_add(1) {
            Some(target) => target,
            // The maximum possible key was the last cell of the table.
            None => {
                self.end_of_table = true;
                return Ok(());
            }
        };

        let (page_num, cell_num) = descend_to_leaf(self.table, target)?;
        if page_num == self.page_num {
            // Still the same leaf: it was the rightmost one.
            self.end_of_table = true;
            return Ok(());
        }

        let next_num_cells = self.table.pager.page(page_num)?.leaf_num_cells();
        self.page_num = page_num;
        self.cell_num = cell_num;
        if cell_num >= next_num_cells {
            self.end_of_table = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::row::Row;
    use crate::storage::table::{insert_row, Table};

    fn open_table(dir: &tempfile::TempDir) -> Table {
        Table::open(dir.path().join("test.db")).unwrap()
    }

    #[test]
    fn test_start_on_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = open_table(&dir);
        let cursor = Cursor::start(&mut table).unwrap();
        assert!(cursor.end_of_table);
        assert_eq!(cursor.cell_num, 0);
    }

    #[test]
    fn test_advance_within_single_leaf() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = open_table(&dir);
        for id in [1, 2, 3] {
            insert_row(&mut table, &Row::new(id, "u", "e")).unwrap();
        }
        let mut cursor = Cursor::start(&mut table).unwrap();
        let mut seen = Vec::new();
        while !cursor.end_of_table {
            let node = cursor.table.pager.page(cursor.page_num).unwrap();
            seen.push(node.leaf_key(cursor.cell_num).unwrap());
            cursor.advance().unwrap();
        }
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn test_find_positions_at_insertion_point() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = open_table(&dir);
        for id in [10, 20, 30] {
            insert_row(&mut table, &Row::new(id, "u", "e")).unwrap();
        }
        let cursor = Cursor::find(&mut table, 20).unwrap();
        assert_eq!(cursor.cell_num, 1);
        let cursor = Cursor::find(&mut table, 25).unwrap();
        assert_eq!(cursor.cell_num, 2);
        let cursor = Cursor::find(&mut table, 35).unwrap();
        assert_eq!(cursor.cell_num, 3);
    }
}
