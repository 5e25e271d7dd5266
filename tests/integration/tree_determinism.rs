//! Integration tests for tree building determinism

use std::fs;
use tempfile::TempDir;
use treesync::tree::{FilterRules, TreeBuilder};

/// Building the tree twice over an unchanged workspace yields bit-identical
/// root hashes.
#[test]
fn test_same_filesystem_same_root() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().to_path_buf();

    fs::write(root.join("file1.txt"), "content1").unwrap();
    fs::write(root.join("file2.txt"), "content2").unwrap();
    fs::create_dir(root.join("dir1")).unwrap();
    fs::write(root.join("dir1").join("file3.txt"), "content3").unwrap();

    let builder = TreeBuilder::new(root, FilterRules::permit_all());
    let tree1 = builder.build().unwrap();
    let tree2 = builder.build().unwrap();

    assert_eq!(tree1.hash, tree2.hash);
    assert_eq!(tree1, tree2);
}

#[test]
fn test_file_content_change_different_root() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().to_path_buf();
    fs::write(root.join("test.txt"), "content1").unwrap();

    let builder = TreeBuilder::new(root.clone(), FilterRules::permit_all());
    let root1 = builder.compute_root().unwrap();

    fs::write(root.join("test.txt"), "content2").unwrap();
    let root2 = builder.compute_root().unwrap();

    assert_ne!(root1, root2);
}

#[test]
fn test_file_addition_different_root() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().to_path_buf();
    fs::write(root.join("file1.txt"), "content").unwrap();

    let builder = TreeBuilder::new(root.clone(), FilterRules::permit_all());
    let root1 = builder.compute_root().unwrap();

    fs::write(root.join("file2.txt"), "content").unwrap();
    let root2 = builder.compute_root().unwrap();

    assert_ne!(root1, root2);
}

/// The root hash changes only along the path to a modified file: the
/// sibling directory node keeps its hash.
#[test]
fn test_unmodified_subtree_hash_is_stable() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().to_path_buf();
    fs::create_dir(root.join("stable")).unwrap();
    fs::write(root.join("stable").join("a.txt"), "a").unwrap();
    fs::create_dir(root.join("volatile")).unwrap();
    fs::write(root.join("volatile").join("b.txt"), "b1").unwrap();

    let builder = TreeBuilder::new(root.clone(), FilterRules::permit_all());
    let tree1 = builder.build().unwrap();

    fs::write(root.join("volatile").join("b.txt"), "b2").unwrap();
    let tree2 = builder.build().unwrap();

    assert_ne!(tree1.hash, tree2.hash);

    let stable1 = tree1.find(&root.join("stable")).unwrap();
    let stable2 = tree2.find(&root.join("stable")).unwrap();
    assert_eq!(stable1.hash, stable2.hash);

    let volatile1 = tree1.find(&root.join("volatile")).unwrap();
    let volatile2 = tree2.find(&root.join("volatile")).unwrap();
    assert_ne!(volatile1.hash, volatile2.hash);
}

/// A large workspace builds deterministically.
#[test]
fn test_large_workspace_deterministic() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().to_path_buf();

    for d in 0..10 {
        let dir = root.join(format!("dir{:02}", d));
        fs::create_dir(&dir).unwrap();
        for f in 0..100 {
            fs::write(dir.join(format!("file{:03}.rs", f)), format!("fn f{}() {{}}", f))
                .unwrap();
        }
    }

    let builder = TreeBuilder::new(root, FilterRules::permit_all());
    let tree1 = builder.build().unwrap();
    let tree2 = builder.build().unwrap();

    assert_eq!(tree1.leaf_paths().len(), 1000);
    assert_eq!(tree1.hash, tree2.hash);
}
