mod common;

use anyhow::Result;

use common::str_row;
use thunder_core::{Db, Error, Query, Row, Schema, Selector, Term};
use thunder_ql::{Op, Value};

#[test]
fn descendants_reach_the_fixed_point() -> Result<()> {
    let db = Db::memory()?;
    let tx = db.begin(true)?;
    {
        let mut employees =
            tx.create_relation("employees", Schema::new(["id", "manager_id"]).index("manager_id"))?;
        for (id, manager) in [("1", "0"), ("2", "1"), ("3", "2"), ("4", "3")] {
            employees.insert(&str_row(&[("id", id), ("manager_id", manager)]))?;
        }

        // path(a, d) <- employees(manager_id = a, id = d)
        // path(a, d) <- employees(manager_id = a, id = b), path(b, d)
        let direct = employees.project(&[("manager_id", "a"), ("id", "d")]);
        let step = employees.project(&[("manager_id", "a"), ("id", "b")]);
        let mut path = Query::new("path", ["ancestor", "descendant"]);
        path.rule(["a", "d"], vec![Term::source(&direct)]);
        path.rule(["a", "d"], vec![Term::source(&step), Term::this(["b", "d"])]);

        let rows: Vec<Row> = path.select(&[Op::eq("ancestor", "1")])?.collect::<Result<_, Error>>()?;
        let descendants: Vec<&Value> = rows.iter().map(|r| &r["descendant"]).collect();
        assert_eq!(descendants, [&Value::from("2"), &Value::from("3"), &Value::from("4")]);

        // The full closure of a four-node chain has 4 + 3 + 2 + 1 tuples,
        // with no duplicates.
        let all: Vec<Row> = path.select(&[])?.collect::<Result<_, Error>>()?;
        assert_eq!(all.len(), 10);
    }
    tx.rollback()?;
    Ok(())
}

#[test]
fn cycles_converge() -> Result<()> {
    let db = Db::memory()?;
    let tx = db.begin(true)?;
    {
        let mut edges = tx.create_relation("edges", Schema::new(["src", "dst"]))?;
        for (src, dst) in [("a", "b"), ("b", "c"), ("c", "a")] {
            edges.insert(&str_row(&[("src", src), ("dst", dst)]))?;
        }

        let direct = edges.project(&[("src", "x"), ("dst", "y")]);
        let step = edges.project(&[("src", "x"), ("dst", "m")]);
        let mut reach = Query::new("reach", ["from", "to"]);
        reach.rule(["x", "y"], vec![Term::source(&direct)]);
        reach.rule(["x", "y"], vec![Term::source(&step), Term::this(["m", "y"])]);

        // Every node reaches every node, including itself, exactly once.
        let rows: Vec<Row> = reach.select(&[])?.collect::<Result<_, Error>>()?;
        assert_eq!(rows.len(), 9);
    }
    tx.rollback()?;
    Ok(())
}

#[test]
fn non_recursive_union_evaluates_in_one_pass() -> Result<()> {
    let db = Db::memory()?;
    let tx = db.begin(true)?;
    {
        let mut cats = tx.create_relation("cats", Schema::new(["name"]))?;
        cats.insert(&str_row(&[("name", "felix")]))?;
        let mut dogs = tx.create_relation("dogs", Schema::new(["name"]))?;
        dogs.insert(&str_row(&[("name", "rex")]))?;
        dogs.insert(&str_row(&[("name", "felix")]))?;

        let cat_pets = cats.project(&[("name", "pet")]);
        let dog_pets = dogs.project(&[("name", "pet")]);
        let mut pets = Query::new("pets", ["pet"]);
        pets.rule(["pet"], vec![Term::source(&cat_pets)]);
        pets.rule(["pet"], vec![Term::source(&dog_pets)]);

        // The union deduplicates by encoded key.
        let rows: Vec<Row> = pets.select(&[])?.collect::<Result<_, Error>>()?;
        assert_eq!(rows, vec![str_row(&[("pet", "felix")]), str_row(&[("pet", "rex")])]);
    }
    tx.rollback()?;
    Ok(())
}

#[test]
fn rule_bodies_join_on_shared_variables() -> Result<()> {
    let db = Db::memory()?;
    let tx = db.begin(true)?;
    {
        let mut parents = tx.create_relation("parents", Schema::new(["parent", "child"]))?;
        parents.insert(&str_row(&[("parent", "ada"), ("child", "bo")]))?;
        parents.insert(&str_row(&[("parent", "bo"), ("child", "cy")]))?;

        // grandparent(g, c) <- parents(g, m), parents(m, c)
        let upper = parents.project(&[("parent", "g"), ("child", "m")]);
        let lower = parents.project(&[("parent", "m"), ("child", "c")]);
        let mut grand = Query::new("grandparents", ["grandparent", "grandchild"]);
        grand.rule(["g", "c"], vec![Term::source(&upper), Term::source(&lower)]);

        let rows: Vec<Row> = grand.select(&[])?.collect::<Result<_, Error>>()?;
        assert_eq!(rows, vec![str_row(&[("grandparent", "ada"), ("grandchild", "cy")])]);
    }
    tx.rollback()?;
    Ok(())
}

#[test]
fn queries_project_like_any_selector() -> Result<()> {
    let db = Db::memory()?;
    let tx = db.begin(true)?;
    {
        let mut edges = tx.create_relation("edges", Schema::new(["src", "dst"]))?;
        edges.insert(&str_row(&[("src", "a"), ("dst", "b")]))?;

        let direct = edges.project(&[("src", "x"), ("dst", "y")]);
        let mut reach = Query::new("reach", ["from", "to"]);
        reach.rule(["x", "y"], vec![Term::source(&direct)]);

        let renamed = reach.project(&[("from", "origin")]);
        let rows: Vec<Row> = renamed.select(&[Op::eq("origin", "a")])?.collect::<Result<_, Error>>()?;
        assert_eq!(rows, vec![str_row(&[("origin", "a"), ("to", "b")])]);
    }
    tx.rollback()?;
    Ok(())
}
