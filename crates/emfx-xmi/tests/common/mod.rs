use std::path::{Path, PathBuf};

use emfx_xmi::{Parsed, Parser};

/// Team with three contained members and a same-document `lead` link
#[allow(dead_code)]
pub const TEAM_XMI: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<team:Team xmi:version="2.0" xmlns:xmi="http://www.omg.org/XMI" xmlns:team="http://example.org/team"
    name="Engineering" budget="1250000" ratio="0.75" active="true" code="007">
  <members name="Alice" age="34"/>
  <members name="Bob" age="41"/>
  <members name="Carol" age="29"/>
  <lead href="#//@members.1"/>
  <tags>backend</tags>
  <tags>oncall</tags>
</team:Team>
"##;

/// Small metamodel with inheritance, an enum and an external data type
#[allow(dead_code)]
pub const PEOPLE_ECORE: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<ecore:EPackage xmi:version="2.0" xmlns:xmi="http://www.omg.org/XMI"
    xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:ecore="http://www.eclipse.org/emf/2002/Ecore"
    name="people" nsURI="http://example.org/people" nsPrefix="people">
  <eClassifiers xsi:type="ecore:EClass" name="Person" abstract="true">
    <eStructuralFeatures xsi:type="ecore:EAttribute" name="name" lowerBound="1"
        eType="ecore:EDataType http://www.eclipse.org/emf/2002/Ecore#//EString"/>
    <eStructuralFeatures xsi:type="ecore:EReference" name="friends" upperBound="-1"
        eType="#//Person" eOpposite="#//Person/friends"/>
  </eClassifiers>
  <eClassifiers xsi:type="ecore:EClass" name="Employee" eSuperTypes="#//Person">
    <eStructuralFeatures xsi:type="ecore:EAttribute" name="level" eType="#//Level"/>
  </eClassifiers>
  <eClassifiers xsi:type="ecore:EEnum" name="Level">
    <eLiterals name="JUNIOR"/>
    <eLiterals name="SENIOR" value="10" literal="senior"/>
  </eClassifiers>
  <eSubpackages name="hr" nsURI="http://example.org/people/hr" nsPrefix="hr">
    <eClassifiers xsi:type="ecore:EClass" name="Department"/>
  </eSubpackages>
</ecore:EPackage>
"##;

/// Document pointing into `other.xmi` next to it
#[allow(dead_code)]
pub const BASE_XMI: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<Project xmi:version="2.0" xmlns:xmi="http://www.omg.org/XMI" name="Apollo">
  <owner href="other.xmi#//@items.1"/>
  <backup href="other.xmi#//@items.7"/>
</Project>
"##;

#[allow(dead_code)]
pub const OTHER_XMI: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<Catalog xmi:version="2.0" xmlns:xmi="http://www.omg.org/XMI">
  <items name="first"/>
  <items name="second"/>
</Catalog>
"##;

/// Parse text with default options
#[allow(dead_code)]
pub fn parse(locator: &str, text: &str) -> Parsed {
    Parser::default()
        .parse_str(locator, text)
        .expect("document should parse")
}

/// Write documents into `dir` and return their paths as locators
#[allow(dead_code)]
pub fn write_documents(dir: &Path, documents: &[(&str, &str)]) -> Vec<String> {
    documents
        .iter()
        .map(|(name, text)| {
            let path: PathBuf = dir.join(name);
            std::fs::write(&path, text).expect("write document");
            path.to_string_lossy().into_owned()
        })
        .collect()
}
