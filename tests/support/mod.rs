use modelpath::{
    AugmentDef, Capability, CapabilityLookups, Context, DeclDef, ModuleDef, ModuleRepository,
    RootSchemaNode,
};
use std::rc::Rc;

pub fn leaf(name: &str) -> DeclDef {
    DeclDef {
        keyword: "leaf".to_string(),
        name: name.to_string(),
        ..Default::default()
    }
}

pub fn container(name: &str, children: Vec<DeclDef>) -> DeclDef {
    DeclDef {
        keyword: "container".to_string(),
        name: name.to_string(),
        children,
        ..Default::default()
    }
}

pub fn list(name: &str, keys: &[&str], children: Vec<DeclDef>) -> DeclDef {
    DeclDef {
        keyword: "list".to_string(),
        name: name.to_string(),
        keys: keys.iter().map(|k| k.to_string()).collect(),
        children,
        ..Default::default()
    }
}

/// `mod-a`: the base module most tests address.
///
/// runner/
///   one/{number,name}
///   ldata (list, key number)
/// ping (rpc with input/destination)
pub fn base_module() -> ModuleDef {
    ModuleDef {
        name: "mod-a".to_string(),
        revision: Some("2024-01-15".to_string()),
        namespace: Some("urn:a".to_string()),
        declarations: vec![
            container(
                "runner",
                vec![
                    container("one", vec![leaf("number"), leaf("name")]),
                    list("ldata", &["number"], vec![leaf("number"), leaf("name")]),
                ],
            ),
            DeclDef {
                keyword: "rpc".to_string(),
                name: "ping".to_string(),
                children: vec![DeclDef {
                    keyword: "input".to_string(),
                    name: "input".to_string(),
                    children: vec![leaf("destination")],
                    ..Default::default()
                }],
                ..Default::default()
            },
        ],
        ..Default::default()
    }
}

/// `mod-b`: augments `runner` from `mod-a` with a leaf `extra`.
pub fn augmenting_module() -> ModuleDef {
    ModuleDef {
        name: "mod-b".to_string(),
        namespace: Some("urn:b".to_string()),
        augments: vec![AugmentDef {
            target: "/mod-a:runner".to_string(),
            children: vec![leaf("extra")],
        }],
        ..Default::default()
    }
}

/// `mod-g`: a container whose content sits behind a grouping reference.
pub fn grouping_module() -> ModuleDef {
    ModuleDef {
        name: "mod-g".to_string(),
        namespace: Some("urn:g".to_string()),
        declarations: vec![container(
            "outer",
            vec![DeclDef {
                keyword: "uses".to_string(),
                name: "shared".to_string(),
                children: vec![container("box", vec![leaf("hidden")])],
                ..Default::default()
            }],
        )],
        ..Default::default()
    }
}

/// `mod-h`: augments a node that sits behind `mod-g`'s grouping reference.
pub fn grouping_augmenter() -> ModuleDef {
    ModuleDef {
        name: "mod-h".to_string(),
        namespace: Some("urn:h".to_string()),
        augments: vec![AugmentDef {
            target: "/mod-g:outer/box".to_string(),
            children: vec![leaf("extra2")],
        }],
        ..Default::default()
    }
}

pub fn repository() -> ModuleRepository {
    let mut repo = ModuleRepository::new();
    repo.register(base_module());
    repo.register(augmenting_module());
    repo.register(grouping_module());
    repo.register(grouping_augmenter());
    repo
}

pub fn lookups() -> CapabilityLookups {
    let mut lookups = CapabilityLookups::default();
    for (identifier, module) in [
        ("mod-a", "mod-a"),
        ("mod-b", "mod-b"),
        ("mod-g", "mod-g"),
        ("mod-h", "mod-h"),
        // Present in the lookup but absent from the repository, for
        // unknown-module propagation tests.
        ("ghost", "ghost"),
    ] {
        lookups.by_name.register(identifier, Capability::new(module));
    }
    for (namespace, module) in [("urn:a", "mod-a"), ("urn:b", "mod-b")] {
        lookups
            .by_namespace
            .register(namespace, Capability::new(module));
    }
    lookups
}

/// A fresh tree over an empty context; everything loads lazily.
pub fn tree() -> RootSchemaNode {
    RootSchemaNode::new(Context::new(), Rc::new(repository()), lookups())
}
