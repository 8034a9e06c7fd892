use emfx_core::metamodel::FeatureShape;
use emfx_core::{EObject, Identifier, Resource, Value};

/// Build the Team/Engineering/Alice-Bob-Carol resource used across tests
///
/// Returns the resource, the team id and the member ids in document order.
#[allow(dead_code)]
pub async fn team_resource(locator: &str) -> (Resource, Identifier, Vec<Identifier>) {
    let resource = Resource::new(locator);
    let (team, members) = {
        let mut contents = resource.write().await;
        let team_class = contents.metamodel_mut().get_or_create_classifier("Team", None);
        let member_class = contents
            .metamodel_mut()
            .get_or_create_classifier("Member", None);

        let team = contents.add(EObject::new(team_class));
        contents
            .e_set(&team, "name", Some(Value::from("Engineering")))
            .unwrap();

        let members: Vec<Identifier> = ["Alice", "Bob", "Carol"]
            .iter()
            .map(|name| {
                let id = contents.register(EObject::new(member_class));
                contents.e_set(&id, "name", Some(Value::from(*name))).unwrap();
                id
            })
            .collect();
        contents
            .set_feature(
                &team,
                "members",
                FeatureShape::Containment,
                Value::from_items(members.iter().copied().map(Value::Object).collect()),
            )
            .unwrap();
        (team, members)
    };
    (resource, team, members)
}
