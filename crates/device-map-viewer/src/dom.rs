use device_map::dom::{Fragment, Node as TreeNode};
use wasm_bindgen::JsValue;
use web_sys::{Document, DocumentFragment, Node};

/// Materialize a rendered fragment as detached browser nodes.
pub fn to_dom(document: &Document, fragment: &Fragment) -> Result<DocumentFragment, JsValue> {
    let result = document.create_document_fragment();
    for node in fragment.nodes() {
        append(document, &result, node)?;
    }
    Ok(result)
}

fn append(document: &Document, parent: &Node, node: &TreeNode) -> Result<(), JsValue> {
    match node {
        TreeNode::Text(text) => {
            parent.append_child(&document.create_text_node(text))?;
        }
        TreeNode::Element(tree) => {
            let element = document.create_element(tree.tag())?;
            if let Some(id) = tree.id() {
                element.set_id(id);
            }
            if !tree.classes().is_empty() {
                element.set_class_name(&tree.classes().join(" "));
            }
            for (name, value) in tree.attributes() {
                element.set_attribute(name, value)?;
            }
            for child in tree.children() {
                append(document, &element, child)?;
            }
            parent.append_child(&element)?;
        }
    }
    Ok(())
}
